//! A small dump with a few broken rows loads everything else.

use chrono::Utc;
use domains::{CatalogRepo, ReviewRepo, Role, UserRepo};
use integration_tests::World;
use services::{
    CommentRow, GenreTitleRow, ImportBundle, NamedSlugRow, ReviewRow, SourceCount, TitleRow,
    UserRow,
};

fn user(id: &str, username: &str, role: Option<Role>) -> UserRow {
    UserRow {
        id: id.into(),
        username: username.into(),
        email: format!("{}@yamdb.fake", username.replace(' ', "_")),
        role,
        bio: Some(String::new()),
        first_name: None,
        last_name: None,
    }
}

fn label(id: &str, name: &str, slug: &str) -> NamedSlugRow {
    NamedSlugRow {
        id: id.into(),
        name: name.into(),
        slug: slug.into(),
    }
}

fn title(id: &str, name: &str, category: &str) -> TitleRow {
    TitleRow {
        id: id.into(),
        name: name.into(),
        year: 1972,
        description: None,
        category: Some(category.into()),
    }
}

fn link(title_id: &str, genre_id: &str) -> GenreTitleRow {
    GenreTitleRow {
        title_id: title_id.into(),
        genre_id: genre_id.into(),
    }
}

fn review(id: &str, title_id: &str, author: &str, score: i64) -> ReviewRow {
    ReviewRow {
        id: id.into(),
        title_id: title_id.into(),
        text: format!("review {id}"),
        author: author.into(),
        score,
        pub_date: Utc::now(),
    }
}

fn comment(id: &str, review_id: &str, author: &str) -> CommentRow {
    CommentRow {
        id: id.into(),
        review_id: review_id.into(),
        text: format!("comment {id}"),
        author: author.into(),
        pub_date: Utc::now(),
    }
}

fn bundle() -> ImportBundle {
    ImportBundle {
        users: vec![
            user("1", "anna", None),
            user("2", "boris", Some(Role::Moderator)),
            user("3", "bad name", None),
        ],
        categories: vec![label("1", "Films", "films"), label("2", "Broken", "bad slug!")],
        genres: vec![label("1", "Drama", "drama"), label("2", "Sci-Fi", "sci-fi")],
        titles: vec![
            title("1", "Stalker", "1"),
            title("2", "Solaris", ""),
            title("3", "Orphan", "1"),
            title("4", "Lost Category", "99"),
        ],
        genre_titles: vec![link("1", "1"), link("2", "1"), link("2", "2"), link("1", "99")],
        reviews: vec![
            review("1", "1", "1", 10),
            review("2", "1", "2", 7),
            review("3", "1", "1", 5),
            review("4", "2", "1", 11),
            review("5", "3", "1", 6),
            review("6", "2", "3", 6),
        ],
        comments: vec![comment("1", "1", "2"), comment("2", "3", "2")],
    }
}

fn count(inserted: usize, skipped: usize) -> SourceCount {
    SourceCount { inserted, skipped }
}

#[tokio::test]
async fn import_reports_per_file_counts() {
    let world = World::new();

    let report = world.importer().import(bundle()).await;

    assert_eq!(report.count("users"), count(2, 1));
    assert_eq!(report.count("categories"), count(1, 1));
    assert_eq!(report.count("genres"), count(2, 0));
    assert_eq!(report.count("genre_title"), count(3, 1));
    assert_eq!(report.count("titles"), count(2, 2));
    assert_eq!(report.count("reviews"), count(2, 4));
    assert_eq!(report.count("comments"), count(1, 1));
    assert_eq!(report.issues.len(), 10);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn skipped_rows_name_their_file_and_position() {
    let world = World::new();

    let report = world.importer().import(bundle()).await;

    let reviews: Vec<usize> = report
        .issues
        .iter()
        .filter(|i| i.source == "reviews")
        .map(|i| i.row)
        .collect();
    assert_eq!(reviews, vec![3, 4, 5, 6]);
    let duplicate = report
        .issues
        .iter()
        .find(|i| i.source == "reviews" && i.row == 3)
        .unwrap();
    assert!(duplicate.reason.contains("already exists"));
}

#[tokio::test]
async fn imported_data_is_linked_and_rated() {
    let world = World::new();
    world.importer().import(bundle()).await;

    let boris = world.store.find_user_by_username("boris").await.unwrap().unwrap();
    assert_eq!(boris.role, Role::Moderator);
    let anna = world.store.find_user_by_username("anna").await.unwrap().unwrap();
    assert_eq!(anna.bio, None);

    let titles = world.store.list_titles().await.unwrap();
    let stalker = titles.iter().find(|t| t.name == "Stalker").unwrap();
    let solaris = titles.iter().find(|t| t.name == "Solaris").unwrap();
    assert_eq!(titles.len(), 2);
    assert!(stalker.category_id.is_some());
    assert_eq!(solaris.category_id, None);
    assert_eq!(solaris.genre_ids.len(), 2);

    assert_eq!(world.rating.rating(stalker.id).await.unwrap(), Some(8.5));
    assert_eq!(world.rating.rating(solaris.id).await.unwrap(), None);

    let reviews = world.store.list_reviews(stalker.id).await.unwrap();
    let first = reviews.iter().find(|r| r.post.author_id == anna.id).unwrap();
    let comments = world.store.list_comments(first.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].post.author_id, boris.id);
}

#[tokio::test]
async fn links_without_a_stored_title_are_reported() {
    let world = World::new();
    let mut future = title("2", "Not Yet Filmed", "");
    future.year = 5000;
    let bundle = ImportBundle {
        genres: vec![label("1", "Drama", "drama")],
        titles: vec![title("1", "Stalker", ""), future],
        genre_titles: vec![link("1", "1"), link("2", "1"), link("404", "1")],
        ..Default::default()
    };

    let report = world.importer().import(bundle).await;

    assert_eq!(report.count("titles"), count(1, 1));
    assert_eq!(report.count("genre_title"), count(1, 2));
    let skipped: Vec<(usize, &str)> = report
        .issues
        .iter()
        .filter(|i| i.source == "genre_title")
        .map(|i| (i.row, i.reason.as_str()))
        .collect();
    assert_eq!(
        skipped,
        vec![(2, "title not found: 2"), (3, "title not found: 404")]
    );
    assert!(!report.is_clean());
}
