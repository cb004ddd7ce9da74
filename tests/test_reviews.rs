use std::sync::Arc;

use game_hub_be::{
    auth::AccountService,
    backend::memory::{MemoryBackend, MemoryOp},
    errors::AppError,
    models::{NewReview, Session},
    reviews::{ReviewListing, ReviewRepository, ReviewStats, repository::REVIEW_CLASS},
    session::SessionContext,
};

async fn sign_up(backend: &MemoryBackend, name: &str, email: &str) -> Session {
    let accounts = AccountService::new(Arc::new(backend.clone()));
    accounts
        .sign_up(
            &SessionContext::absent(),
            name,
            email,
            "hunter22",
            "hunter22",
            Some("game-controller"),
        )
        .await
        .unwrap()
}

fn repository(backend: &MemoryBackend) -> ReviewRepository {
    ReviewRepository::new(Arc::new(backend.clone()))
}

#[tokio::test]
async fn test_list_by_game_is_newest_first_with_author() {
    let backend = MemoryBackend::new();
    let repo = repository(&backend);
    let ana = sign_up(&backend, "Ana", "ana@example.com").await;
    let bruno = sign_up(&backend, "Bruno", "bruno@example.com").await;

    for (session, score) in [(&ana, 5), (&bruno, 3), (&ana, 4)] {
        let review = NewReview::new("3498", "Grand Theft Auto V", score, None).unwrap();
        repo.create(session, review).await.unwrap();
    }
    let other = NewReview::new("4200", "Portal 2", 1, None).unwrap();
    repo.create(&ana, other).await.unwrap();

    let reviews = repo.list_by_game("3498").await.unwrap();
    let scores: Vec<u8> = reviews.iter().map(|r| r.score.value()).collect();
    assert_eq!(scores, vec![4, 3, 5]);
    assert_eq!(reviews[1].author.display_name.as_deref(), Some("Bruno"));
    assert_eq!(reviews[0].author.avatar.as_deref(), Some("game-controller"));

    let stats = ReviewStats::from_reviews(&reviews);
    assert!((stats.average_score - 4.0).abs() < 1e-9);
    assert_eq!(stats.total_count, 3);
}

#[tokio::test]
async fn test_list_by_game_without_reviews_is_empty() {
    let backend = MemoryBackend::new();
    let repo = repository(&backend);

    let reviews = repo.list_by_game("1").await.unwrap();
    assert!(reviews.is_empty());

    let listing = ReviewListing::new(&reviews);
    assert_eq!(listing.stats.average_score, 0.0);
    assert_eq!(listing.stats.total_count, 0);
    assert_eq!(listing.stats.commented_count, 0);
}

#[tokio::test]
async fn test_create_returns_persisted_record() {
    let backend = MemoryBackend::new();
    let repo = repository(&backend);
    let ana = sign_up(&backend, "Ana", "ana@example.com").await;

    let review = NewReview::new("3498", "Grand Theft Auto V", 5, Some("  Masterpiece  ")).unwrap();
    let record = repo.create(&ana, review).await.unwrap();

    assert!(!record.id.is_empty());
    assert_eq!(record.comment.as_deref(), Some("Masterpiece"));
    assert_eq!(record.author.id, ana.account.id);

    let listed = repo.list_by_author(&ana.account.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, record.id);
    assert_eq!(listed[0].created_at, record.created_at);
}

#[tokio::test]
async fn test_invalid_input_never_reaches_the_store() {
    let backend = MemoryBackend::new();

    let zero = NewReview::new("3498", "GTA V", 0, None);
    assert!(matches!(zero, Err(AppError::Validation(_))));

    let long = "a".repeat(501);
    let too_long = NewReview::new("3498", "GTA V", 4, Some(&long));
    assert!(matches!(too_long, Err(AppError::Validation(_))));

    assert_eq!(backend.calls(MemoryOp::Create).await, 0);
}

#[tokio::test]
async fn test_comment_of_exactly_500_chars_is_accepted() {
    let backend = MemoryBackend::new();
    let repo = repository(&backend);
    let ana = sign_up(&backend, "Ana", "ana@example.com").await;

    let comment = "a".repeat(500);
    let review = NewReview::new("3498", "GTA V", 4, Some(&comment)).unwrap();
    let record = repo.create(&ana, review).await.unwrap();

    assert_eq!(record.comment.map(|c| c.len()), Some(500));
    assert_eq!(backend.calls(MemoryOp::Create).await, 1);
}

#[tokio::test]
async fn test_list_by_author_only_returns_own_reviews() {
    let backend = MemoryBackend::new();
    let repo = repository(&backend);
    let ana = sign_up(&backend, "Ana", "ana@example.com").await;
    let bruno = sign_up(&backend, "Bruno", "bruno@example.com").await;

    repo.create(&ana, NewReview::new("1", "Celeste", 5, Some("tough")).unwrap())
        .await
        .unwrap();
    repo.create(&bruno, NewReview::new("1", "Celeste", 2, None).unwrap())
        .await
        .unwrap();
    repo.create(&ana, NewReview::new("2", "Hades", 4, None).unwrap())
        .await
        .unwrap();

    let mine = repo.list_by_author(&ana.account.id).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].game_name, "Hades");
    assert!(mine.iter().all(|r| r.author.id == ana.account.id));

    let stats = ReviewStats::from_reviews(&mine);
    assert_eq!(stats.commented_count, 1);
    assert!((stats.average_score - 4.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_duplicate_reviews_for_the_same_game_are_kept() {
    let backend = MemoryBackend::new();
    let repo = repository(&backend);
    let ana = sign_up(&backend, "Ana", "ana@example.com").await;

    repo.create(&ana, NewReview::new("1", "Celeste", 5, None).unwrap())
        .await
        .unwrap();
    repo.create(&ana, NewReview::new("1", "Celeste", 1, None).unwrap())
        .await
        .unwrap();

    assert_eq!(repo.list_by_game("1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_missing_review_is_not_found_and_list_unchanged() {
    let backend = MemoryBackend::new();
    let repo = repository(&backend);
    let ana = sign_up(&backend, "Ana", "ana@example.com").await;

    repo.create(&ana, NewReview::new("1", "Celeste", 5, None).unwrap())
        .await
        .unwrap();
    let before = repo.list_by_author(&ana.account.id).await.unwrap();

    let err = repo.delete_by_id(&ana, "does-not-exist").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let after = repo.list_by_author(&ana.account.id).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_second_delete_reports_not_found() {
    let backend = MemoryBackend::new();
    let repo = repository(&backend);
    let ana = sign_up(&backend, "Ana", "ana@example.com").await;

    let record = repo
        .create(&ana, NewReview::new("1", "Celeste", 3, None).unwrap())
        .await
        .unwrap();

    repo.delete_by_id(&ana, &record.id).await.unwrap();
    assert_eq!(backend.count(REVIEW_CLASS).await, 0);

    let err = repo.delete_by_id(&ana, &record.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_cannot_delete_someone_elses_review() {
    let backend = MemoryBackend::new();
    let repo = repository(&backend);
    let ana = sign_up(&backend, "Ana", "ana@example.com").await;
    let bruno = sign_up(&backend, "Bruno", "bruno@example.com").await;

    let record = repo
        .create(&ana, NewReview::new("1", "Celeste", 3, None).unwrap())
        .await
        .unwrap();

    let err = repo.delete_by_id(&bruno, &record.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_eq!(backend.count(REVIEW_CLASS).await, 1);
}

#[tokio::test]
async fn test_backend_failure_surfaces_as_persistence_error() {
    let backend = MemoryBackend::new();
    let repo = repository(&backend);
    let ana = sign_up(&backend, "Ana", "ana@example.com").await;

    backend.set_failing(MemoryOp::Create, true).await;
    let err = repo
        .create(&ana, NewReview::new("1", "Celeste", 3, None).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Persistence(_)));
    // not retried
    assert_eq!(backend.calls(MemoryOp::Create).await, 1);

    backend.set_failing(MemoryOp::Find, true).await;
    let err = repo.list_by_game("1").await.unwrap_err();
    assert!(matches!(err, AppError::Persistence(_)));
}

#[tokio::test]
async fn test_orphaned_review_falls_back_to_generic_author() {
    let backend = MemoryBackend::new();
    let repo = repository(&backend);
    let ana = sign_up(&backend, "Ana", "ana@example.com").await;

    repo.create(&ana, NewReview::new("1", "Celeste", 4, None).unwrap())
        .await
        .unwrap();
    backend.remove_account(&ana.account.id).await;

    let listing = ReviewListing::new(&repo.list_by_game("1").await.unwrap());
    assert_eq!(listing.reviews.len(), 1);
    assert_eq!(listing.reviews[0].display_name, "User");
    assert_eq!(listing.reviews[0].avatar, "person-circle");
}
