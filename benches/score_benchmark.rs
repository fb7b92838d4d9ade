use chrono::{Duration, NaiveDate};
use criterion::{criterion_group, criterion_main, Criterion};
use sportify_api::models::{
    activity_score, ActivityKind, ActivityLog, ActivityTotals, Coordinates, User,
};
use sportify_api::services::gyms::nearby;
use sportify_api::services::leaderboard::rank;
use sportify_api::services::GymCatalog;
use std::hint::black_box;

/// Three years of daily running, steps and gym entries.
fn long_history() -> Vec<ActivityLog> {
    let start = NaiveDate::from_ymd_opt(2022, 1, 1).expect("valid date");
    (0..3 * 365)
        .flat_map(|day| {
            let date = start + Duration::days(day);
            [
                ActivityLog::new(date, ActivityKind::Running, 5.0 + (day % 7) as f64),
                ActivityLog::new(date, ActivityKind::Steps, 8000.0 + (day % 13) as f64 * 100.0),
                ActivityLog::new(date, ActivityKind::GymTime, 45.0),
            ]
        })
        .collect()
}

fn benchmark_scoring(c: &mut Criterion) {
    let history = long_history();

    let mut group = c.benchmark_group("scoring");
    group.bench_function("activity_score_3y", |b| {
        b.iter(|| activity_score(black_box(&history)))
    });
    group.bench_function("totals_3y", |b| {
        b.iter(|| ActivityTotals::from_logs(black_box(&history)))
    });
    group.finish();
}

fn benchmark_leaderboard(c: &mut Criterion) {
    let history = long_history();
    let users: Vec<User> = (0..1000)
        .map(|i| {
            let mut user = User::new(
                &format!("User {i}"),
                &format!("user{i}@example.com"),
                "hash".to_string(),
            );
            user.tracked_activities = history[..(i * 3) % history.len()].to_vec();
            user
        })
        .collect();

    c.bench_function("rank_1000_users", |b| {
        b.iter(|| rank(black_box(users.clone()), 10))
    });
}

fn benchmark_nearby(c: &mut Criterion) {
    let catalog =
        GymCatalog::load_from_file("data/gyms.geojson").expect("Failed to load gym catalog");
    let origin = Coordinates {
        latitude: 24.7136,
        longitude: 46.6753,
    };

    c.bench_function("gyms_around_you", |b| {
        b.iter(|| nearby(black_box(catalog.gyms()), origin, 5000.0))
    });
}

criterion_group!(
    benches,
    benchmark_scoring,
    benchmark_leaderboard,
    benchmark_nearby
);
criterion_main!(benches);
