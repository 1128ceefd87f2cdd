// All LLM prompt constants for interview content generation.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Question generation prompt. Replace `{cv_text}` and `{job_description}` before sending.
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Create 5 specific interview questions based on the CV and the job description below.

CV:
{cv_text}

Job description:
{job_description}

Requirements:
1. Mix behavioral, technical, and situational questions.
2. Keep each question concise and speakable in under 20 seconds.

Return a JSON array of strings, e.g. ["Question one?", "Question two?"]"#;

/// STAR story prompt. Replace `{cv_text}` and `{job_description}` before sending.
pub const STORIES_PROMPT_TEMPLATE: &str = r#"Analyze the CV and job description below. Identify 3 STAR stories
(Situation, Task, Action, Result) the candidate could tell to prove they fit the role.

CV:
{cv_text}

Job description:
{job_description}

Return a JSON array with this EXACT schema:
[
  {
    "title": "Short title, e.g. Leadership in a crisis",
    "situation": "Brief context",
    "task": "What needed to be done",
    "action": "What the candidate did, in active voice",
    "result": "The positive outcome"
  }
]"#;

/// Answer analysis prompt. Replace `{question}` and `{answer}` before sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the candidate's spoken answer to an interview question.

Question: "{question}"
Answer (transcribed): "{answer}"

Return a JSON object with this EXACT schema (no extra fields):
{
  "feedback_text": "Two sentences max of constructive feedback.",
  "improvement_tip": "One actionable tip.",
  "better_answer_example": "A short example of a stronger answer."
}"#;

/// Final report prompt. Replace `{session_data}` before sending.
pub const REPORT_PROMPT_TEMPLATE: &str = r#"You are a senior interview assessor. Produce a final performance
report from the question/answer pairs below.

Session data:
{session_data}

Return a JSON object with this EXACT schema:
{
  "overall_score": 75,
  "summary": "A paragraph summarizing the candidate's performance.",
  "strengths": ["Strength 1", "Strength 2"],
  "areas_for_improvement": ["Weakness 1", "Weakness 2"],
  "metrics": {"clarity": 8, "relevance": 7, "confidence": 6}
}

overall_score is an integer from 0 to 100. Every metric is an integer from 1 to 10."#;
