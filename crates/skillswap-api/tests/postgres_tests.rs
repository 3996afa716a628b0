//! PostgreSQL adapter tests: require a reachable database.
//!
//! Run with:
//!   DATABASE_URL=postgres://localhost/skillswap_test cargo test -p skillswap-api --test postgres_tests -- --include-ignored
//!
//! Migrations are applied on connect. Every test registers fresh users, so
//! runs can share one database.

use std::sync::Arc;

use chrono::Utc;
use skillswap_api::db::principals::PgPrincipalDirectory;
use skillswap_api::db::swap_requests::PgSwapRequestRepository;
use skillswap_api::directory::PrincipalDirectory;
use skillswap_api::repository::{
    Conditional, RepositoryError, Scope, SwapFilter, SwapRequestRepository,
};
use skillswap_api::service::{SwapError, SwapService};
use skillswap_core::{MeetingType, Note, Priority, SkillLabel, SwapRequestId, Timeline, UserId};
use skillswap_state::{NewSwapRequest, RespondAction, SwapRequest, SwapStatus};
use sqlx::PgPool;

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for these tests");
    skillswap_api::db::init_pool(Some(&url))
        .await
        .expect("failed to connect or migrate")
        .expect("a URL was supplied")
}

async fn insert_user(pool: &PgPool, name: &str, active: bool) -> UserId {
    let id = UserId::new();
    sqlx::query("INSERT INTO users (id, email, name, is_active) VALUES ($1, $2, $3, $4)")
        .bind(id.as_uuid())
        .bind(format!("{}-{id}@example.com", name.to_lowercase()))
        .bind(name)
        .bind(active)
        .execute(pool)
        .await
        .unwrap();
    id
}

fn pending(requester: UserId, provider: UserId, skill: &str) -> SwapRequest {
    SwapRequest::new_pending(
        NewSwapRequest {
            requester_id: requester,
            provider_id: provider,
            skill_requested: SkillLabel::new("skillRequested", skill).unwrap(),
            skill_category: SkillLabel::new("skillCategory", "Programming").unwrap(),
            message: Note::new("message", "Trade for guitar lessons?").unwrap(),
            priority: Priority::High,
            preferred_meeting_type: MeetingType::Online,
            timeline: Timeline::ThisWeek,
        },
        Utc::now(),
    )
    .unwrap()
}

struct Fixture {
    pool: PgPool,
    repo: PgSwapRequestRepository,
    requester: UserId,
    provider: UserId,
}

async fn fixture() -> Fixture {
    let pool = pool().await;
    let requester = insert_user(&pool, "Alice", true).await;
    let provider = insert_user(&pool, "Bob", true).await;
    Fixture {
        repo: PgSwapRequestRepository::new(pool.clone()),
        pool,
        requester,
        provider,
    }
}

// -- Storage guarantees -------------------------------------------------------

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn pending_triple_index_rejects_second_insert() {
    let f = fixture().await;
    let first = f
        .repo
        .insert(pending(f.requester, f.provider, "Rust"))
        .await
        .unwrap();

    let err = f
        .repo
        .insert(pending(f.requester, f.provider, "Rust"))
        .await
        .unwrap_err();
    assert_eq!(err, RepositoryError::DuplicatePending);

    // A different skill, or the reverse direction, is a different triple.
    f.repo
        .insert(pending(f.requester, f.provider, "Go"))
        .await
        .unwrap();
    f.repo
        .insert(pending(f.provider, f.requester, "Rust"))
        .await
        .unwrap();

    // Once the first leaves `pending` the triple is free again.
    let declined = first
        .respond(f.provider, RespondAction::Decline, Note::empty(), Utc::now())
        .unwrap();
    assert!(matches!(
        f.repo
            .compare_and_swap_status(first.id, SwapStatus::Pending, declined)
            .await
            .unwrap(),
        Conditional::Applied(_)
    ));
    f.repo
        .insert(pending(f.requester, f.provider, "Rust"))
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn conditional_update_applies_only_on_expected_status() {
    let f = fixture().await;
    let record = f
        .repo
        .insert(pending(f.requester, f.provider, "Rust"))
        .await
        .unwrap();
    let accepted = record
        .respond(
            f.provider,
            RespondAction::Accept,
            Note::new("responseMessage", "Deal").unwrap(),
            Utc::now(),
        )
        .unwrap();

    let Conditional::Applied(stored) = f
        .repo
        .compare_and_swap_status(record.id, SwapStatus::Pending, accepted.clone())
        .await
        .unwrap()
    else {
        panic!("first write should apply");
    };
    assert_eq!(stored.status, SwapStatus::Accepted);
    assert_eq!(stored.response_message.as_str(), "Deal");
    assert!(stored.responded_at.is_some());
    assert_eq!(stored.priority, Priority::High);
    assert_eq!(stored.timeline, Timeline::ThisWeek);

    // Same precondition again: the row has moved on.
    assert_eq!(
        f.repo
            .compare_and_swap_status(record.id, SwapStatus::Pending, accepted.clone())
            .await
            .unwrap(),
        Conditional::Conflict(SwapStatus::Accepted)
    );
    assert_eq!(
        f.repo
            .compare_and_swap_status(SwapRequestId::new(), SwapStatus::Pending, accepted)
            .await
            .unwrap(),
        Conditional::NotFound
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn conditional_delete_applies_only_on_expected_status() {
    let f = fixture().await;
    let withdrawn = f
        .repo
        .insert(pending(f.requester, f.provider, "Rust"))
        .await
        .unwrap();
    let answered = f
        .repo
        .insert(pending(f.requester, f.provider, "Go"))
        .await
        .unwrap();
    let accepted = answered
        .respond(f.provider, RespondAction::Accept, Note::empty(), Utc::now())
        .unwrap();
    f.repo
        .compare_and_swap_status(answered.id, SwapStatus::Pending, accepted)
        .await
        .unwrap();

    assert_eq!(
        f.repo
            .delete_if_status(answered.id, SwapStatus::Pending)
            .await
            .unwrap(),
        Conditional::Conflict(SwapStatus::Accepted)
    );
    assert_eq!(
        f.repo
            .delete_if_status(withdrawn.id, SwapStatus::Pending)
            .await
            .unwrap(),
        Conditional::Applied(())
    );
    assert_eq!(
        f.repo
            .delete_if_status(withdrawn.id, SwapStatus::Pending)
            .await
            .unwrap(),
        Conditional::NotFound
    );
    assert!(f.repo.find_by_id(withdrawn.id).await.unwrap().is_none());
}

// -- Queries ------------------------------------------------------------------

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn filters_by_scope_and_status() {
    let f = fixture().await;
    let carol = insert_user(&f.pool, "Carol", true).await;

    let sent = f
        .repo
        .insert(pending(f.requester, f.provider, "Rust"))
        .await
        .unwrap();
    f.repo
        .insert(pending(carol, f.requester, "Chess"))
        .await
        .unwrap();
    f.repo
        .insert(pending(carol, f.provider, "Piano"))
        .await
        .unwrap();
    let accepted = sent
        .respond(f.provider, RespondAction::Accept, Note::empty(), Utc::now())
        .unwrap();
    f.repo
        .compare_and_swap_status(sent.id, SwapStatus::Pending, accepted)
        .await
        .unwrap();

    let all = SwapFilter::involving(f.requester);
    assert_eq!(f.repo.count(&all).await.unwrap(), 2);
    assert_eq!(f.repo.count(&all.scope(Scope::Sent)).await.unwrap(), 1);
    assert_eq!(f.repo.count(&all.scope(Scope::Received)).await.unwrap(), 1);
    assert_eq!(
        f.repo
            .count(&all.status(Some(SwapStatus::Accepted)))
            .await
            .unwrap(),
        1
    );

    let received = f
        .repo
        .find_many(&all.scope(Scope::Received))
        .await
        .unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].requester_id, carol);

    let newest_first = f.repo.find_many(&all).await.unwrap();
    assert!(newest_first[0].created_at >= newest_first[1].created_at);

    let found = f
        .repo
        .find_pending(
            carol,
            f.requester,
            &SkillLabel::new("skillRequested", "Chess").unwrap(),
        )
        .await
        .unwrap();
    assert!(found.is_some());
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn joined_view_and_directory_read_users_table() {
    let f = fixture().await;
    let directory = PgPrincipalDirectory::new(f.pool.clone());
    let record = f
        .repo
        .insert(pending(f.requester, f.provider, "Rust"))
        .await
        .unwrap();

    let view = f
        .repo
        .find_with_parties(record.id, &directory)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.requester.unwrap().name, "Alice");
    assert_eq!(view.provider.unwrap().name, "Bob");

    let summaries = directory
        .summaries(&[f.requester, f.provider, UserId::new()])
        .await
        .unwrap();
    assert_eq!(summaries.len(), 2);

    let dormant = insert_user(&f.pool, "Dora", false).await;
    assert!(!directory.find_by_id(dormant).await.unwrap().unwrap().active);
    assert!(directory.find_by_id(UserId::new()).await.unwrap().is_none());
}

// -- Service over PostgreSQL ----------------------------------------------------

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn concurrent_responses_have_exactly_one_winner() {
    let f = fixture().await;
    let service = SwapService::new(
        Arc::new(PgSwapRequestRepository::new(f.pool.clone())),
        Arc::new(PgPrincipalDirectory::new(f.pool.clone())),
    );
    let created = service
        .create(NewSwapRequest {
            requester_id: f.requester,
            provider_id: f.provider,
            skill_requested: SkillLabel::new("skillRequested", "Rust").unwrap(),
            skill_category: SkillLabel::new("skillCategory", "Programming").unwrap(),
            message: Note::empty(),
            priority: Priority::default(),
            preferred_meeting_type: MeetingType::default(),
            timeline: Timeline::default(),
        })
        .await
        .unwrap();
    let id = created.request.id;

    let (accept, decline) = tokio::join!(
        service.respond(id, f.provider, RespondAction::Accept, Note::empty()),
        service.respond(id, f.provider, RespondAction::Decline, Note::empty()),
    );
    let outcomes = [accept, decline];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(SwapError::InvalidTransition(_)))));
}
