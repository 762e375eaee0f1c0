use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::game::error::GameError;

/// Creates the account on first credit.
pub async fn tx_credit_player(
    tx: &mut Transaction<'_, Postgres>,
    player_id: Uuid,
    amount: u64,
) -> Result<(), GameError> {
    let amount = i64::try_from(amount)
        .map_err(|_| GameError::Validation(format!("Amount {} is too large", amount)))?;

    sqlx::query(
        r#"
        INSERT INTO "player" (id, balance, updated_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE
        SET balance = "player".balance + EXCLUDED.balance, updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(player_id)
    .bind(amount)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn get_player_balance(pool: &Pool<Postgres>, player_id: Uuid) -> Result<u64, GameError> {
    let balance = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT balance FROM "player"
        WHERE id = $1
        "#,
    )
    .bind(player_id)
    .fetch_optional(pool)
    .await?
    .unwrap_or(0);

    u64::try_from(balance)
        .map_err(|_| GameError::Validation(format!("Player {} has negative balance", player_id)))
}
