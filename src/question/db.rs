use sqlx::{Pool, Postgres};
use tracing::error;
use uuid::Uuid;

use crate::question::models::{Level, QuestionRow};

pub async fn get_random_question_by_level(
    pool: &Pool<Postgres>,
    level: Level,
    exclude: &[Uuid],
) -> Result<Option<QuestionRow>, sqlx::Error> {
    let option = sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT id, text, answer1, answer2, answer3, answer4, level
        FROM "question"
        WHERE level = $1 AND NOT (id = ANY($2))
        ORDER BY RANDOM()
        LIMIT 1
        "#,
    )
    .bind(level.value() as i16)
    .bind(exclude)
    .fetch_optional(pool)
    .await?;

    if option.is_none() {
        error!("No unused question left in the bank for level {}", level);
    }

    Ok(option)
}
