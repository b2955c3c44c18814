// LLM prompt templates for job extraction and cover-letter writing.
// Placeholders are `{name}` tokens filled with `str::replace` before sending.

/// Job extraction prompt. Replace `{page_data}` before sending.
pub const EXTRACT_JOBS_PROMPT_TEMPLATE: &str = r#"### SCRAPED TEXT FROM WEBSITE:
{page_data}

### INSTRUCTION:
The scraped text is from the careers page of a website, or a job description
pasted by the user. Extract the job postings and return them as a JSON array of
objects with these keys:
  "role":        job title (string)
  "experience":  required experience, as written (string, may be empty)
  "skills":      required and preferred skills (array of strings)
  "description": a faithful summary of the posting (string)

Return one object per distinct posting. If there is a single posting, still
return an array with one object. Only return valid JSON.

### VALID JSON (NO PREAMBLE):"#;

/// Cover-letter prompt. Every `{...}` token is replaced before sending.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"You are an expert technical career writer.

### Candidate Profile
- Name: {name}
- Education: {education}
- Email: {email}
- Phone: {phone}
- Key skills: {skills}
- Links: {links}
- Resume highlights:
{resume_text}

### Job Posting
- Role: {job_role}
- Experience: {job_experience}
- Required/Preferred skills: {job_skills}
- Description:
{job_description}

### Preferences
- Tone: {tone}
- Style: {style}
- Length: {length}
- Template hint: {template}

Write a tailored cover letter addressed to the hiring manager. Requirements:
- Start with a strong introduction specific to the role "{job_role}".
- Align the candidate's experience and skills to the job.
- Reference 1-3 relevant links if applicable.
- Keep it {length} in length, with {tone} tone and {style} style.
- End with a concise, confident closing and a call to action.

Output only the final cover letter. No headings, no JSON, no extra commentary."#;
