//! Deletions ripple through the store exactly as far as they should.

use domains::{CatalogRepo, DomainError, ReviewRepo, Role, TitleDraft, UserRepo};
use integration_tests::World;

#[tokio::test]
async fn deleting_a_title_removes_its_reviews_and_comments() {
    let world = World::new();
    let admin = world.user("root", Role::Admin).await.actor();
    let drama = world.genre("drama").await;
    let title = world.title("Stalker", &[&drama], None).await;
    let kept = world.title("Mirror", &[&drama], None).await;
    let anna = world.user("anna", Role::User).await;
    let review = world.review(&anna, &title, 9).await;
    let comment = world.comment(&anna, &review).await;
    let other = world.review(&anna, &kept, 5).await;

    world.catalog.delete_title(Some(&admin), title.id).await.unwrap();

    assert!(world.store.find_title(title.id).await.unwrap().is_none());
    assert!(world.store.find_review(review.id).await.unwrap().is_none());
    assert!(world.store.find_comment(comment.id).await.unwrap().is_none());
    assert!(world.store.find_review(other.id).await.unwrap().is_some());
    assert!(matches!(
        world.reviews.list_reviews(title.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn deleting_a_user_removes_their_posts_everywhere() {
    let world = World::new();
    let admin = world.user("root", Role::Admin).await.actor();
    let drama = world.genre("drama").await;
    let title = world.title("Stalker", &[&drama], None).await;
    let anna = world.user("anna", Role::User).await;
    let boris = world.user("boris", Role::User).await;

    let annas_review = world.review(&anna, &title, 9).await;
    let reply_to_anna = world.comment(&boris, &annas_review).await;
    let boris_review = world.review(&boris, &title, 3).await;
    let annas_comment = world.comment(&anna, &boris_review).await;

    world.accounts.delete_user(Some(&admin), "anna").await.unwrap();

    assert!(world.store.find_user(anna.id).await.unwrap().is_none());
    assert!(world.store.find_review(annas_review.id).await.unwrap().is_none());
    assert!(world.store.find_comment(reply_to_anna.id).await.unwrap().is_none());
    assert!(world.store.find_comment(annas_comment.id).await.unwrap().is_none());
    assert!(world.store.find_review(boris_review.id).await.unwrap().is_some());
    assert_eq!(world.rating.rating(title.id).await.unwrap(), Some(3.0));
}

#[tokio::test]
async fn deleting_a_category_keeps_its_titles() {
    let world = World::new();
    let admin = world.user("root", Role::Admin).await.actor();
    let films = world.category("films").await;
    let drama = world.genre("drama").await;
    let title = world.title("Stalker", &[&drama], Some(&films)).await;

    world.catalog.delete_category(Some(&admin), "films").await.unwrap();

    let view = world.catalog.get_title(title.id).await.unwrap();
    assert_eq!(view.category, None);
    assert_eq!(view.genre.len(), 1);
    assert!(world.store.find_category(films.id).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_a_genre_only_drops_the_association() {
    let world = World::new();
    let admin = world.user("root", Role::Admin).await.actor();
    let drama = world.genre("drama").await;
    let scifi = world.genre("sci-fi").await;
    let title = world.title("Solaris", &[&drama, &scifi], None).await;

    world.catalog.delete_genre(Some(&admin), "sci-fi").await.unwrap();

    let view = world.catalog.get_title(title.id).await.unwrap();
    let slugs: Vec<_> = view.genre.iter().map(|g| g.slug().to_string()).collect();
    assert_eq!(slugs, vec!["drama"]);
}

#[tokio::test]
async fn non_admins_cannot_delete_catalog_entries() {
    let world = World::new();
    let moderator = world.user("mod", Role::Moderator).await.actor();
    let drama = world.genre("drama").await;
    let title = world.title("Stalker", &[&drama], None).await;

    let result = world.catalog.delete_title(Some(&moderator), title.id).await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));
    assert_eq!(
        world.catalog.delete_genre(None, "drama").await.unwrap_err(),
        DomainError::Unauthenticated
    );
    assert!(world.store.find_title(title.id).await.unwrap().is_some());
}

#[tokio::test]
async fn title_without_genres_still_takes_partial_updates() {
    let world = World::new();
    let admin = world.user("root", Role::Admin).await.actor();
    let drama = world.genre("drama").await;
    let title = world.title("Stalker", &[&drama], None).await;
    world.catalog.delete_genre(Some(&admin), "drama").await.unwrap();

    let view = world
        .catalog
        .update_title(
            Some(&admin),
            title.id,
            TitleDraft {
                year: Some(1980),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(view.year, 1980);
    assert!(view.genre.is_empty());
}
