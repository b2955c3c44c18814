//! Profile store queries. Every statement is scoped by `user_id`; a record id
//! belonging to another user behaves exactly like a missing one.

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{CertificationRow, ExperienceRow, PortfolioItemRow, ProfileRow};
use crate::profile::validation::{
    ValidCertification, ValidExperience, ValidPortfolioItem, ValidProfile,
};

// ────────────────────────────────────────────────────────────────────────────
// Profile
// ────────────────────────────────────────────────────────────────────────────

/// Returns the user's profile, creating an empty one on first access.
pub async fn get_or_create_profile(db: &PgPool, user_id: Uuid) -> Result<ProfileRow, AppError> {
    sqlx::query("INSERT INTO profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(db)
        .await?;

    let profile = sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(profile)
}

pub async fn save_profile(
    db: &PgPool,
    user_id: Uuid,
    profile: &ValidProfile,
) -> Result<ProfileRow, AppError> {
    let (replace_resume, resume_text) = match &profile.resume_text {
        Some(text) => (true, text.clone()),
        None => (false, None),
    };

    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        INSERT INTO profiles
            (user_id, name, email, education, phone, links, skills, resume_text, bio, linkedin, github)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $9, $10, $11, $12)
        ON CONFLICT (user_id) DO UPDATE SET
            name        = EXCLUDED.name,
            email       = EXCLUDED.email,
            education   = EXCLUDED.education,
            phone       = EXCLUDED.phone,
            links       = EXCLUDED.links,
            skills      = EXCLUDED.skills,
            resume_text = CASE WHEN $8 THEN EXCLUDED.resume_text ELSE profiles.resume_text END,
            bio         = EXCLUDED.bio,
            linkedin    = EXCLUDED.linkedin,
            github      = EXCLUDED.github,
            updated_at  = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&profile.name)
    .bind(&profile.email)
    .bind(&profile.education)
    .bind(&profile.phone)
    .bind(&profile.links)
    .bind(&profile.skills)
    .bind(replace_resume)
    .bind(resume_text)
    .bind(&profile.bio)
    .bind(&profile.linkedin)
    .bind(&profile.github)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Stores extracted résumé text together with the location of the original upload.
pub async fn save_resume(
    db: &PgPool,
    user_id: Uuid,
    resume_text: Option<&str>,
    file_path: &str,
    file_name: &str,
    file_mime: Option<&str>,
) -> Result<ProfileRow, AppError> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        INSERT INTO profiles (user_id, resume_text, resume_file_path, resume_file_name, resume_file_mime)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE SET
            resume_text      = EXCLUDED.resume_text,
            resume_file_path = EXCLUDED.resume_file_path,
            resume_file_name = EXCLUDED.resume_file_name,
            resume_file_mime = EXCLUDED.resume_file_mime,
            updated_at       = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(resume_text)
    .bind(file_path)
    .bind(file_name)
    .bind(file_mime)
    .fetch_one(db)
    .await?;
    Ok(row)
}

// ────────────────────────────────────────────────────────────────────────────
// Portfolio items
// ────────────────────────────────────────────────────────────────────────────

pub async fn list_portfolio_items(db: &PgPool, user_id: Uuid) -> Result<Vec<PortfolioItemRow>, AppError> {
    let rows = sqlx::query_as::<_, PortfolioItemRow>(
        "SELECT * FROM portfolio_items WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn create_portfolio_item(
    db: &PgPool,
    user_id: Uuid,
    item: &ValidPortfolioItem,
) -> Result<PortfolioItemRow, AppError> {
    let row = sqlx::query_as::<_, PortfolioItemRow>(
        r#"
        INSERT INTO portfolio_items (user_id, title, url, skills, description)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&item.title)
    .bind(&item.url)
    .bind(&item.skills)
    .bind(&item.description)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update_portfolio_item(
    db: &PgPool,
    user_id: Uuid,
    id: i64,
    item: &ValidPortfolioItem,
) -> Result<PortfolioItemRow, AppError> {
    sqlx::query_as::<_, PortfolioItemRow>(
        r#"
        UPDATE portfolio_items
        SET title = $3, url = $4, skills = $5, description = $6
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&item.title)
    .bind(&item.url)
    .bind(&item.skills)
    .bind(&item.description)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Portfolio item {id} not found")))
}

pub async fn delete_portfolio_item(db: &PgPool, user_id: Uuid, id: i64) -> Result<(), AppError> {
    delete_scoped(db, "portfolio_items", "Portfolio item", user_id, id).await
}

// ────────────────────────────────────────────────────────────────────────────
// Certifications
// ────────────────────────────────────────────────────────────────────────────

pub async fn list_certifications(db: &PgPool, user_id: Uuid) -> Result<Vec<CertificationRow>, AppError> {
    let rows = sqlx::query_as::<_, CertificationRow>(
        "SELECT * FROM certifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn create_certification(
    db: &PgPool,
    user_id: Uuid,
    cert: &ValidCertification,
) -> Result<CertificationRow, AppError> {
    let row = sqlx::query_as::<_, CertificationRow>(
        r#"
        INSERT INTO certifications (user_id, title, issuer, date, skills)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&cert.title)
    .bind(&cert.issuer)
    .bind(&cert.date)
    .bind(&cert.skills)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update_certification(
    db: &PgPool,
    user_id: Uuid,
    id: i64,
    cert: &ValidCertification,
) -> Result<CertificationRow, AppError> {
    sqlx::query_as::<_, CertificationRow>(
        r#"
        UPDATE certifications
        SET title = $3, issuer = $4, date = $5, skills = $6
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&cert.title)
    .bind(&cert.issuer)
    .bind(&cert.date)
    .bind(&cert.skills)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Certification {id} not found")))
}

pub async fn delete_certification(db: &PgPool, user_id: Uuid, id: i64) -> Result<(), AppError> {
    delete_scoped(db, "certifications", "Certification", user_id, id).await
}

// ────────────────────────────────────────────────────────────────────────────
// Experiences
// ────────────────────────────────────────────────────────────────────────────

pub async fn list_experiences(db: &PgPool, user_id: Uuid) -> Result<Vec<ExperienceRow>, AppError> {
    let rows = sqlx::query_as::<_, ExperienceRow>(
        "SELECT * FROM experiences WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn create_experience(
    db: &PgPool,
    user_id: Uuid,
    exp: &ValidExperience,
) -> Result<ExperienceRow, AppError> {
    let row = sqlx::query_as::<_, ExperienceRow>(
        r#"
        INSERT INTO experiences (user_id, role, organization, years, skills, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&exp.role)
    .bind(&exp.organization)
    .bind(&exp.years)
    .bind(&exp.skills)
    .bind(&exp.description)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update_experience(
    db: &PgPool,
    user_id: Uuid,
    id: i64,
    exp: &ValidExperience,
) -> Result<ExperienceRow, AppError> {
    sqlx::query_as::<_, ExperienceRow>(
        r#"
        UPDATE experiences
        SET role = $3, organization = $4, years = $5, skills = $6, description = $7
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&exp.role)
    .bind(&exp.organization)
    .bind(&exp.years)
    .bind(&exp.skills)
    .bind(&exp.description)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Experience {id} not found")))
}

pub async fn delete_experience(db: &PgPool, user_id: Uuid, id: i64) -> Result<(), AppError> {
    delete_scoped(db, "experiences", "Experience", user_id, id).await
}

/// `table` is always one of the fixed table names above, never user input.
async fn delete_scoped(
    db: &PgPool,
    table: &str,
    label: &str,
    user_id: Uuid,
    id: i64,
) -> Result<(), AppError> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1 AND user_id = $2"))
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("{label} {id} not found")));
    }
    Ok(())
}
