use std::sync::Arc;

use orderable::{
    FixedClock, OrderingDomain,
    fixtures::{self, DemoServices},
    order::Placement,
    scope::GroupKey,
};

use crate::helpers::{ids_in, test_backend, titles_in};

async fn seeded() -> (DemoServices, fixtures::SeedReport) {
    let services = DemoServices::new(test_backend().await, Arc::new(FixedClock::default())).unwrap();
    let report = fixtures::seed(&services).await.unwrap();
    (services, report)
}

#[tokio::test]
async fn test_seed_join_groups() {
    let (services, report) = seeded().await;
    let join_a = OrderingDomain::relation(fixtures::ORDERABLE, report.join_a.clone());
    let join_b = OrderingDomain::relation(fixtures::ORDERABLE, report.join_b.clone());

    assert_eq!(
        titles_in(&services.orderable_by_join, &join_a).await,
        ["A", "B", "C", "D"]
    );
    assert!(ids_in(&services.orderable_by_join, &join_b).await.is_empty());
    assert_eq!(
        titles_in(
            &services.orderable_join,
            &OrderingDomain::global(fixtures::ORDERABLE_JOIN)
        )
        .await,
        ["Join A", "Join B"]
    );
}

#[tokio::test]
async fn test_seed_global_and_join_orders_are_independent() {
    let (services, report) = seeded().await;
    let global = OrderingDomain::global(fixtures::ORDERABLE);
    let join_a = OrderingDomain::relation(fixtures::ORDERABLE, report.join_a.clone());

    // Reverse the global order only
    let d = report.orderable[3].clone();
    services
        .orderable
        .move_item(&d, Placement::Start)
        .await
        .unwrap();

    assert_eq!(
        titles_in(&services.orderable, &global).await,
        ["D", "A", "B", "C"]
    );
    assert_eq!(
        titles_in(&services.orderable_by_join, &join_a).await,
        ["A", "B", "C", "D"]
    );
}

#[tokio::test]
async fn test_seed_non_unique_buckets() {
    let (services, report) = seeded().await;
    assert_eq!(report.posts.len(), fixtures::POST_COUNT);

    let all = services.non_unique_sort.list_all().await.unwrap();
    let listed: Vec<(Option<GroupKey>, String)> = all
        .into_iter()
        .map(|i| {
            (
                i.group,
                i.record.str_field("title").unwrap().to_string(),
            )
        })
        .collect();
    let expected: Vec<(Option<GroupKey>, String)> = (0..fixtures::POST_COUNT)
        .map(|i| {
            (
                Some(GroupKey::Bucket(fixtures::bucket_for(i))),
                format!("Post {i}"),
            )
        })
        .collect();
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn test_reseeding_replaces_data() {
    let (services, _first) = seeded().await;
    let second = fixtures::seed(&services).await.unwrap();

    let global = OrderingDomain::global(fixtures::ORDERABLE);
    assert_eq!(ids_in(&services.orderable, &global).await, second.orderable);
    assert_eq!(
        services.non_unique_sort.list_all().await.unwrap().len(),
        fixtures::POST_COUNT
    );
}

#[tokio::test]
async fn test_move_item_between_seeded_joins() {
    let (services, report) = seeded().await;
    let b = report.orderable[1].clone();
    services
        .orderable_by_join
        .move_to_group(&b, GroupKey::Relation(report.join_b.clone()), Placement::End)
        .await
        .unwrap();

    let join_a = OrderingDomain::relation(fixtures::ORDERABLE, report.join_a.clone());
    let join_b = OrderingDomain::relation(fixtures::ORDERABLE, report.join_b.clone());
    assert_eq!(
        titles_in(&services.orderable_by_join, &join_a).await,
        ["A", "C", "D"]
    );
    assert_eq!(ids_in(&services.orderable_by_join, &join_b).await, [b]);
}
