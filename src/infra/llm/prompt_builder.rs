use crate::domain::{GenerationRequest, GenerationTask, RequestField};

/// Keeps the model from inventing experience the applicant does not have.
pub const NO_FABRICATION_CLAUSE: &str = "Adapt the content carefully to avoid including experiences not present in my resume but mentioned in the job description.";

/// Used by the polish template when no polishing instruction was supplied.
pub const GENERIC_POLISH_INSTRUCTION: &str = "Return the polished version, highlighting necessary adjustments for clarity, relevance, and impact in relation to the targeted role.";

pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(task: GenerationTask, request: &GenerationRequest) -> String {
        match task {
            GenerationTask::Advice => advice_prompt(
                request.get(RequestField::Position),
                request.get(RequestField::JobDescription),
                request.get(RequestField::ResumeContent),
            ),
            GenerationTask::CoverLetter => cover_letter_prompt(
                request.get(RequestField::CompanyName),
                request.get(RequestField::Position),
                request.get(RequestField::JobDescription),
                request.get(RequestField::ResumeContent),
            ),
            GenerationTask::Polish => polish_prompt(
                request.get(RequestField::Position),
                request.get(RequestField::ResumeContent),
                request.get(RequestField::PolishInstructions),
            ),
        }
    }
}

pub fn advice_prompt(position: &str, job_description: &str, resume_content: &str) -> String {
    format!(
        "Considering the job description: {job_description}, and the resume provided: {resume_content}, identify areas for enhancement in the resume. Offer specific suggestions on how to improve these aspects to better match the job requirements and increase the likelihood of being selected for the position of {position}."
    )
}

pub fn cover_letter_prompt(
    company_name: &str,
    position: &str,
    job_description: &str,
    resume_content: &str,
) -> String {
    format!(
        "Generate a customized cover letter using the company name: {company_name}, the position applied for: {position}, and the job description: {job_description}. Ensure the cover letter highlights my qualifications and experience as detailed in the resume content: {resume_content}. {NO_FABRICATION_CLAUSE} The goal is to emphasize the alignment between my existing skills and the requirements of the role."
    )
}

pub fn polish_prompt(position: &str, resume_content: &str, instructions: &str) -> String {
    let instructions = instructions.trim();
    if instructions.is_empty() {
        format!(
            "Suggest improvements for the following resume content: '{resume_content}' to better align with the requirements and expectations of a {position} position. {GENERIC_POLISH_INSTRUCTION}"
        )
    } else {
        format!(
            "Given the resume content: '{resume_content}', polish it based on the following instructions: {instructions} for the {position} position."
        )
    }
}
