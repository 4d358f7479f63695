// All LLM prompt constants for the analysis module.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM, PLAIN_TEXT_SYSTEM};

pub const ANALYZE_MAX_TOKENS: u32 = 3000;
pub const EXTRACT_MAX_TOKENS: u32 = 800;
pub const CAREER_MAX_TOKENS: u32 = 1200;
pub const POLISH_MAX_TOKENS: u32 = 600;

pub const ANALYZE_SYSTEM: &str = JSON_ONLY_SYSTEM;
pub const EXTRACT_SKILLS_SYSTEM: &str = JSON_ONLY_SYSTEM;
pub const CAREER_SYSTEM: &str = JSON_ONLY_SYSTEM;
pub const POLISH_SYSTEM: &str = PLAIN_TEXT_SYSTEM;

/// Skill extraction prompt. Replace `{TEXT}` before sending.
pub const EXTRACT_SKILLS_PROMPT: &str = r#"Extract the technical skills, tools and technologies mentioned in the text below.

Return a JSON object exactly like:
{"skills": ["skill1", "skill2"]}

Text:
{TEXT}"#;

/// Full JD vs CV analysis prompt. Replace `{JD}` and `{CV}` before sending.
pub const ANALYZE_PROMPT_TEMPLATE: &str = r#"You are an expert career assistant. Compare the job description (JD) with the candidate CV.

Return a JSON object with this EXACT schema:
{
  "required_skills": ["skills the JD explicitly asks for"],
  "cv_skills": ["skills the CV explicitly shows"],
  "missing_skills": ["required skills absent from the CV"],
  "suitability": {"score": 0.0, "label": "Strong Fit|Potential Fit|Not a Fit"},
  "difficulty_estimate": {"score": 0.0, "reason": "short reason"},
  "suggested_improvements": [
    {"title": "short title", "description": "1-2 sentences", "keyword": "missing skill or null",
     "suggestion": "CV bullet to add afterwards", "priority": "high|medium|low", "resources": ["..."]}
  ],
  "confidence": 0.0
}

Rules:
- suitability.score and confidence are numbers between 0 and 1.
- required_skills must be copied from the JD text; cv_skills must be copied from the CV text.
  Skills that cannot be found in the source text invalidate the whole answer.
- If the JD is non-technical or too short, return "required_skills": [].

JD:
{JD}

CV:
{CV}"#;

/// Career suggestions prompt. Replace `{JD}` and `{CV}` before sending.
pub const CAREER_SUGGEST_PROMPT: &str = r#"You are a practical career advisor. Given a job description (JD) and a candidate CV,
produce a JSON array of up to 3 actionable, realistic recommendations that improve the candidate's fit. Each item:

{
  "title": "Short title",
  "description": "1-2 sentence plan with steps and expected duration (e.g. 2-6 weeks)",
  "cv_bullet": "One CV bullet the candidate can add afterwards",
  "priority": "high|medium|low",
  "resources": ["up to 3 free docs or courses"]
}

Be conservative and realistic. Respond only with the JSON array.

JD:
{JD}

CV:
{CV}"#;

/// Summary polish prompt. Replace `{ANALYSIS}` with the structured fields as JSON.
pub const POLISH_PROMPT: &str = r#"Write ONE short paragraph (3-5 sentences) for a job applicant summarizing the analysis below:
their fit, the most important missing skills and the first concrete action to take.
Use only the facts provided. Do not invent skills or recommendations.

Analysis (JSON):
{ANALYSIS}"#;

pub fn extract_skills_prompt(text: &str) -> String {
    format!(
        "{}\n\n{GROUNDING_INSTRUCTION}",
        EXTRACT_SKILLS_PROMPT.replace("{TEXT}", text)
    )
}

pub fn analyze_prompt(jd: &str, cv: &str) -> String {
    format!(
        "{}\n\n{GROUNDING_INSTRUCTION}",
        ANALYZE_PROMPT_TEMPLATE.replace("{JD}", jd).replace("{CV}", cv)
    )
}

pub fn career_prompt(jd: &str, cv: &str) -> String {
    CAREER_SUGGEST_PROMPT.replace("{JD}", jd).replace("{CV}", cv)
}

pub fn polish_prompt(analysis_json: &str) -> String {
    POLISH_PROMPT.replace("{ANALYSIS}", analysis_json)
}
