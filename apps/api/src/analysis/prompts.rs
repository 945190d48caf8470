// Prompt template for the narrative assessment.
// The response is stored as opaque prose; nothing parses the section headings.

/// Assessment prompt template. Replace `{jd}` and `{resume}` before sending.
pub const ASSESSMENT_PROMPT_TEMPLATE: &str = r#"You are an expert ATS (Application Tracking System) analyzer and career counselor.
Analyze the following resume against the job description with high precision.

Job Description:
{jd}

Resume Content:
{resume}

Please provide a detailed analysis in the following format:

**MATCH PERCENTAGE:** [Provide exact percentage 0-100]

**KEY STRENGTHS:**
• [List 3-5 key matching strengths]

**MISSING KEYWORDS:**
• [List 5-10 important missing keywords from job description]

**IMPROVEMENT RECOMMENDATIONS:**
• [Provide 3-5 specific actionable recommendations]

**SKILLS GAP ANALYSIS:**
• [Identify skill gaps and suggest improvements]

**OVERALL ASSESSMENT:**
[Provide comprehensive feedback and next steps]
"#;

/// Embeds both texts verbatim. `{resume}` is substituted first so a job
/// description that happens to contain the literal `{resume}` is left intact.
pub fn build_assessment_prompt(job_description: &str, resume: &str) -> String {
    ASSESSMENT_PROMPT_TEMPLATE
        .replacen("{resume}", resume, 1)
        .replacen("{jd}", job_description, 1)
}
