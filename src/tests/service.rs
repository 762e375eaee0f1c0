use std::{collections::HashSet, sync::Arc};

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    game::{
        error::GameError,
        game_question::Letter,
        hints::HintKind,
        memory::MemoryBackend,
        models::{AnswerOutcome, CreateOutcome, GameRules, GameStatus, TakeMoneyOutcome},
        service::GameService,
        store::SessionStore,
    },
    question::models::Level,
    tests::fixtures::{question, seeded_backend, setup_logging},
};

fn service(per_level: usize) -> GameService<MemoryBackend> {
    setup_logging();
    GameService::new(seeded_backend(per_level), GameRules::default())
}

async fn correct_letter(service: &GameService<MemoryBackend>, game_id: Uuid) -> Letter {
    let session = service.backend().find_by_id(game_id).await.unwrap().unwrap();
    session.current_game_question().unwrap().correct_answer_key()
}

async fn wrong_letter(service: &GameService<MemoryBackend>, game_id: Uuid) -> Letter {
    let correct = correct_letter(service, game_id).await;
    Letter::ALL.into_iter().find(|l| *l != correct).unwrap()
}

#[tokio::test]
async fn creates_game_with_fifteen_distinct_questions() {
    let service = service(4);
    let player = Uuid::new_v4();

    let outcome = service.create_game_for_player(player).await.unwrap();

    let CreateOutcome::Created(game) = outcome else {
        panic!("Expected a new game");
    };
    assert_eq!(service.backend().game_count(), 1);
    assert_eq!(game.player_id, player);
    assert_eq!(game.status(Utc::now(), service.rules()), GameStatus::InProgress);

    let levels: Vec<u8> = game.questions().iter().map(|q| q.level().value()).collect();
    assert_eq!(levels, (0..=14).collect::<Vec<u8>>());

    let bank_ids: HashSet<Uuid> = game.questions().iter().map(|q| q.question().id).collect();
    assert_eq!(bank_ids.len(), 15);
    assert!(game.questions().iter().all(|q| q.game_id == game.id));
}

#[tokio::test]
async fn second_create_returns_existing_game() {
    let service = service(2);
    let player = Uuid::new_v4();

    let first = service.create_game_for_player(player).await.unwrap();
    let second = service.create_game_for_player(player).await.unwrap();

    assert!(!first.is_existing());
    assert!(second.is_existing());
    assert_eq!(first.session().id, second.session().id);
    assert_eq!(service.backend().game_count(), 1);
}

#[tokio::test]
async fn players_get_separate_games() {
    let service = service(2);

    let a = service.create_game_for_player(Uuid::new_v4()).await.unwrap();
    let b = service.create_game_for_player(Uuid::new_v4()).await.unwrap();

    assert_ne!(a.session().id, b.session().id);
    assert_eq!(service.backend().game_count(), 2);
}

#[tokio::test]
async fn missing_level_aborts_creation() {
    setup_logging();
    let backend = MemoryBackend::new();
    for level in Level::all().filter(|l| l.value() != 7) {
        backend.insert_question(question(level.value(), level.index())).unwrap();
    }
    let service = GameService::new(backend, GameRules::default());

    let result = service.create_game_for_player(Uuid::new_v4()).await;

    assert!(matches!(
        result,
        Err(GameError::InsufficientQuestions(level)) if level.value() == 7
    ));
    assert_eq!(service.backend().game_count(), 0);
}

#[tokio::test]
async fn duplicate_bank_text_is_rejected() {
    let backend = MemoryBackend::new();
    backend.insert_question(question(0, 1)).unwrap();

    let mut duplicate = question(3, 1);
    duplicate.text = duplicate.text.to_uppercase();

    assert!(matches!(
        backend.insert_question(duplicate),
        Err(GameError::Validation(_))
    ));
}

#[tokio::test]
async fn concurrent_creation_yields_one_game() {
    let service = Arc::new(service(3));
    let player = Uuid::new_v4();

    let handles = (0..20).map(|_| {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.create_game_for_player(player).await })
    });

    let results = futures::future::join_all(handles).await;
    let ids: HashSet<Uuid> = results
        .into_iter()
        .map(|r| r.unwrap().unwrap().session().id)
        .collect();

    assert_eq!(ids.len(), 1);
    assert_eq!(service.backend().game_count(), 1);
}

#[tokio::test]
async fn concurrent_answers_are_never_double_applied() {
    let service = Arc::new(service(2));
    let player = Uuid::new_v4();
    let game_id = service
        .create_game_for_player(player)
        .await
        .unwrap()
        .session()
        .id;
    let letter = correct_letter(&service, game_id).await;

    let handles = (0..10).map(|_| {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.answer(player, game_id, letter).await })
    });

    let results = futures::future::join_all(handles).await;
    let mut correct = 0;
    for result in results {
        match result.unwrap() {
            Ok((_, AnswerOutcome::Correct { .. })) => correct += 1,
            Ok(_) | Err(GameError::VersionConflict(_)) => {}
            Err(e) => panic!("Unexpected error: {}", e),
        }
    }

    let stored = service.backend().find_by_id(game_id).await.unwrap().unwrap();
    assert!(correct >= 1);
    assert_eq!(stored.current_level as usize, correct);
}

#[tokio::test]
async fn winning_credits_top_prize_and_frees_the_slot() {
    let service = service(1);
    let player = Uuid::new_v4();
    let game_id = service
        .create_game_for_player(player)
        .await
        .unwrap()
        .session()
        .id;

    let mut last = None;
    for _ in 0..15 {
        let letter = correct_letter(&service, game_id).await;
        let (_, outcome) = service.answer(player, game_id, letter).await.unwrap();
        last = Some(outcome);
    }

    assert_eq!(last, Some(AnswerOutcome::Won { prize: 1_000_000 }));
    assert_eq!(service.balance(player).await.unwrap(), 1_000_000);

    let game = service.get_game(player, game_id).await.unwrap();
    assert_eq!(game.status(Utc::now(), service.rules()), GameStatus::Won);
    assert!(service.backend().find_active_by_player(player).await.unwrap().is_none());
}

#[tokio::test]
async fn wrong_answer_fails_without_credit() {
    let service = service(2);
    let player = Uuid::new_v4();
    let game_id = service
        .create_game_for_player(player)
        .await
        .unwrap()
        .session()
        .id;

    let letter = wrong_letter(&service, game_id).await;
    let (game, outcome) = service.answer(player, game_id, letter).await.unwrap();

    assert!(matches!(outcome, AnswerOutcome::Incorrect { .. }));
    assert_eq!(game.status(Utc::now(), service.rules()), GameStatus::Fail);
    assert_eq!(service.balance(player).await.unwrap(), 0);

    let next = service.create_game_for_player(player).await.unwrap();
    assert!(!next.is_existing());
}

#[tokio::test]
async fn take_money_credits_previous_level_prize() {
    let service = service(2);
    let player = Uuid::new_v4();
    let game_id = service
        .create_game_for_player(player)
        .await
        .unwrap()
        .session()
        .id;

    assert!(matches!(
        service.take_money(player, game_id).await,
        Err(GameError::NothingToBank)
    ));

    for _ in 0..4 {
        let letter = correct_letter(&service, game_id).await;
        service.answer(player, game_id, letter).await.unwrap();
    }

    let (game, outcome) = service.take_money(player, game_id).await.unwrap();

    assert_eq!(outcome, TakeMoneyOutcome::Banked { prize: 500 });
    assert_eq!(game.status(Utc::now(), service.rules()), GameStatus::Money);
    assert_eq!(service.balance(player).await.unwrap(), 500);
}

#[tokio::test]
async fn answer_after_deadline_times_out() {
    let service = service(2);
    let player = Uuid::new_v4();
    let game_id = service
        .create_game_for_player(player)
        .await
        .unwrap()
        .session()
        .id;

    let mut stored = service.backend().find_by_id(game_id).await.unwrap().unwrap();
    stored.created_at = Utc::now() - Duration::minutes(36);
    service.backend().save_atomic(&stored, None, 0).await.unwrap();

    let letter = correct_letter(&service, game_id).await;
    let (game, outcome) = service.answer(player, game_id, letter).await.unwrap();

    assert_eq!(outcome, AnswerOutcome::TimedOut { prize: 0 });
    assert_eq!(game.current_level, 0);
    assert_eq!(game.status(Utc::now(), service.rules()), GameStatus::Timeout);

    let reloaded = service.get_game(player, game_id).await.unwrap();
    assert_eq!(reloaded.status(Utc::now(), service.rules()), GameStatus::Timeout);
}

#[tokio::test]
async fn reading_an_expired_game_finalizes_it() {
    let service = service(2);
    let player = Uuid::new_v4();
    let game_id = service
        .create_game_for_player(player)
        .await
        .unwrap()
        .session()
        .id;

    let mut stored = service.backend().find_by_id(game_id).await.unwrap().unwrap();
    stored.created_at = Utc::now() - Duration::minutes(40);
    service.backend().save_atomic(&stored, None, 0).await.unwrap();

    let game = service.get_game(player, game_id).await.unwrap();

    assert!(game.is_failed);
    assert_eq!(game.status(Utc::now(), service.rules()), GameStatus::Timeout);
    assert!(service.backend().find_active_by_player(player).await.unwrap().is_none());
}

#[tokio::test]
async fn hints_are_persisted_and_single_use() {
    let service = service(2);
    let player = Uuid::new_v4();
    let game_id = service
        .create_game_for_player(player)
        .await
        .unwrap()
        .session()
        .id;

    service
        .use_hint(player, game_id, HintKind::FiftyFifty)
        .await
        .unwrap();
    service
        .use_hint(player, game_id, HintKind::FriendCall)
        .await
        .unwrap();

    let game = service.get_game(player, game_id).await.unwrap();
    let question = game.current_game_question().unwrap();
    let kept = question.hints.fifty_fifty.unwrap();

    assert!(kept.contains(&question.correct_answer_key()));
    assert!(question.hints.friend_call.is_some());
    assert!(question.hints.audience_help.is_none());
    assert!(game.fifty_fifty_used && game.friend_call_used);

    assert!(matches!(
        service.use_hint(player, game_id, HintKind::FiftyFifty).await,
        Err(GameError::HintAlreadyUsed(HintKind::FiftyFifty))
    ));
}

#[tokio::test]
async fn foreign_game_is_not_found() {
    let service = service(2);
    let owner = Uuid::new_v4();
    let game_id = service
        .create_game_for_player(owner)
        .await
        .unwrap()
        .session()
        .id;

    let intruder = Uuid::new_v4();
    assert!(matches!(
        service.get_game(intruder, game_id).await,
        Err(GameError::NotFound(_))
    ));
    assert!(matches!(
        service.answer(intruder, game_id, Letter::A).await,
        Err(GameError::NotFound(_))
    ));
    assert!(matches!(
        service.get_game(owner, Uuid::new_v4()).await,
        Err(GameError::NotFound(_))
    ));
}

#[tokio::test]
async fn lists_games_newest_first() {
    let service = service(3);
    let player = Uuid::new_v4();

    let first = service
        .create_game_for_player(player)
        .await
        .unwrap()
        .session()
        .id;
    let letter = wrong_letter(&service, first).await;
    service.answer(player, first, letter).await.unwrap();

    let second = service
        .create_game_for_player(player)
        .await
        .unwrap()
        .session()
        .id;

    let page = service.list_games(player, 0, 20).await.unwrap();
    let ids: Vec<Uuid> = page.items().iter().map(|g| g.id).collect();

    assert_eq!(ids, vec![second, first]);
    assert_eq!(page.items()[0].status, GameStatus::InProgress);
    assert_eq!(page.items()[1].status, GameStatus::Fail);
    assert!(!page.has_next());

    let small = service.list_games(player, 0, 1).await.unwrap();
    assert_eq!(small.items().len(), 1);
    assert!(small.has_next());
}

#[tokio::test]
async fn seed_file_fills_a_whole_ladder() {
    setup_logging();
    let path = format!("{}/demos/questions.json", env!("CARGO_MANIFEST_DIR"));
    let backend = MemoryBackend::from_seed_file(&path).unwrap();
    let service = GameService::new(backend, GameRules::default());

    let outcome = service.create_game_for_player(Uuid::new_v4()).await.unwrap();
    assert_eq!(outcome.session().questions().len(), 15);

    assert!(matches!(
        MemoryBackend::from_seed_file("does/not/exist.json"),
        Err(GameError::Validation(_))
    ));
}

#[tokio::test]
async fn stale_live_slot_does_not_block_a_new_game() {
    let service = service(3);
    let player = Uuid::new_v4();
    let first = service
        .create_game_for_player(player)
        .await
        .unwrap()
        .session()
        .id;
    let letter = wrong_letter(&service, first).await;
    service.answer(player, first, letter).await.unwrap();

    // Slot still pointing at the finished game, as between a save and its release
    service.backend().pin_active(player, first);
    assert!(service.backend().find_active_by_player(player).await.unwrap().is_none());

    let next = service.create_game_for_player(player).await.unwrap();

    assert!(!next.is_existing());
    assert_ne!(next.session().id, first);
    let active = service.backend().find_active_by_player(player).await.unwrap().unwrap();
    assert_eq!(active.id, next.session().id);
}

#[tokio::test]
async fn stale_save_credits_nothing() {
    let service = service(2);
    let player = Uuid::new_v4();
    let game_id = service
        .create_game_for_player(player)
        .await
        .unwrap()
        .session()
        .id;

    let stale = service.backend().find_by_id(game_id).await.unwrap().unwrap();
    service.backend().save_atomic(&stale, None, 0).await.unwrap();

    let result = service.backend().save_atomic(&stale, None, 500).await;

    assert!(matches!(result, Err(GameError::VersionConflict(id)) if id == game_id));
    assert_eq!(service.balance(player).await.unwrap(), 0);
}

mod failing_credit {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::{
        common::models::PagedResponse,
        game::{
            game_question::GameQuestion,
            models::{GameSession, GameSummary},
            store::{Ledger, QuestionBank},
        },
        question::models::Question,
    };

    /// Memory backend whose next paying write fails before anything is stored.
    struct FailingCredit {
        inner: MemoryBackend,
        fail_next: AtomicBool,
    }

    impl QuestionBank for FailingCredit {
        async fn sample(&self, level: Level, exclude: &[Uuid]) -> Result<Arc<Question>, GameError> {
            self.inner.sample(level, exclude).await
        }
    }

    impl SessionStore for FailingCredit {
        async fn find_active_by_player(
            &self,
            player_id: Uuid,
        ) -> Result<Option<GameSession>, GameError> {
            self.inner.find_active_by_player(player_id).await
        }

        async fn find_by_id(
            &self,
            game_id: Uuid,
        ) -> Result<Option<GameSession>, GameError> {
            self.inner.find_by_id(game_id).await
        }

        async fn create_atomic(
            &self,
            session: &GameSession,
        ) -> Result<CreateOutcome, GameError> {
            self.inner.create_atomic(session).await
        }

        async fn save_atomic(
            &self,
            session: &GameSession,
            question: Option<&GameQuestion>,
            payout: u64,
        ) -> Result<(), GameError> {
            if payout > 0 && self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(GameError::Database(sqlx::Error::PoolTimedOut));
            }
            self.inner.save_atomic(session, question, payout).await
        }

        async fn list_by_player(
            &self,
            player_id: Uuid,
            page_num: u16,
            page_size: u16,
        ) -> Result<PagedResponse<GameSummary>, GameError> {
            self.inner.list_by_player(player_id, page_num, page_size).await
        }

        async fn health_check(&self) -> Result<(), GameError> {
            self.inner.health_check().await
        }
    }

    impl Ledger for FailingCredit {
        async fn balance(&self, player_id: Uuid) -> Result<u64, GameError> {
            self.inner.balance(player_id).await
        }
    }

    #[tokio::test]
    async fn failed_payout_leaves_game_open_for_retry() {
        setup_logging();
        let backend = FailingCredit {
            inner: seeded_backend(2),
            fail_next: AtomicBool::new(true),
        };
        let service = GameService::new(backend, GameRules::default());
        let player = Uuid::new_v4();
        let game_id = service
            .create_game_for_player(player)
            .await
            .unwrap()
            .session()
            .id;

        for _ in 0..4 {
            let session = service.backend().find_by_id(game_id).await.unwrap().unwrap();
            let letter = session.current_game_question().unwrap().correct_answer_key();
            service.answer(player, game_id, letter).await.unwrap();
        }

        let first = service.take_money(player, game_id).await;
        assert!(matches!(first, Err(GameError::Database(_))));

        let stored = service.backend().find_by_id(game_id).await.unwrap().unwrap();
        assert!(!stored.is_finished());
        assert_eq!(stored.prize, 0);
        assert_eq!(service.balance(player).await.unwrap(), 0);

        let (_, retry) = service.take_money(player, game_id).await.unwrap();
        assert_eq!(retry, TakeMoneyOutcome::Banked { prize: 500 });
        assert_eq!(service.balance(player).await.unwrap(), 500);
    }
}
