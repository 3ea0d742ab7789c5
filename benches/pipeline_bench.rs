//! Benchmarks for the per-interaction work of the dashboard.
//!
//! Every sidebar change re-runs filtering plus the four chart views, and
//! every board step replays the opening line from scratch, so both are
//! measured on a synthetic table sized like the lichess games dataset.

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use chess_dashboard_core::game::split_moves;
use chess_dashboard_core::{
    audit_moves, reconstruct_position, statistics_views_native, AggregateConfig, AuditConfig,
    GameRecord, GameTable, SidebarSelection, TimeControlCategory, VictoryStatus, Winner,
};

const NUM_GAMES: usize = 20_000;

const LINES: [(&str, &str); 4] = [
    ("Italian Game", "e4 e5 Nf3 Nc6 Bc4 Bc5 c3 Nf6 d3 d6 O-O O-O"),
    ("Sicilian Defense", "e4 c5 Nf3 d6 d4 cxd4 Nxd4 Nf6 Nc3 a6"),
    ("Queen's Gambit Declined", "d4 d5 c4 e6 Nc3 Nf6 Bg5 Be7 e3 O-O"),
    ("French Defense", "e4 e6 d4 d5 Nc3 Bb4 e5 c5 a3 Bxc3+ bxc3"),
];

const CATEGORIES: [TimeControlCategory; 3] = [
    TimeControlCategory::Bullet,
    TimeControlCategory::Blitz,
    TimeControlCategory::Rapid,
];

fn synthetic_table() -> GameTable {
    let games = (0..NUM_GAMES)
        .map(|i| {
            let (opening_name, moves) = LINES[i % LINES.len()];
            GameRecord {
                id: format!("g{}", i),
                rated: i % 3 != 0,
                turns: 20 + (i % 60) as u32,
                white_rating: 800 + (i * 37 % 1600) as u32,
                black_rating: 800 + (i * 53 % 1600) as u32,
                winner: match i % 5 {
                    0 | 1 => Winner::White,
                    2 | 3 => Winner::Black,
                    _ => Winner::Draw,
                },
                victory_status: VictoryStatus::Resign,
                time_control_category: CATEGORIES[i % CATEGORIES.len()],
                increment: [0, 2, 5, 10][i % 4],
                initial_time: 300,
                opening_name: opening_name.to_string(),
                opening_ply: 6,
                moves: split_moves(moves),
            }
        })
        .collect();
    GameTable::new(games)
}

pub fn dashboard_pipeline(c: &mut Criterion) {
    let table = synthetic_table();
    let config = AggregateConfig::default();
    let mut selection = SidebarSelection::new(TimeControlCategory::Blitz);
    selection.increment = Some(5);

    c.bench_function("statistics views, blitz +5", |b| {
        b.iter(|| statistics_views_native(black_box(&table), black_box(&selection), &config));
    });
}

pub fn replay(c: &mut Criterion) {
    let moves = split_moves(LINES[0].1);
    let last = moves.len() - 1;

    c.bench_function("reconstruct position, full italian line", |b| {
        b.iter(|| reconstruct_position(black_box(&moves), black_box(last)).unwrap());
    });
}

pub fn audit(c: &mut Criterion) {
    let table = synthetic_table();
    let config = AuditConfig::default();

    c.bench_function("audit moves, all threads", |b| {
        b.iter(|| {
            let faults = audit_moves(black_box(&table), &config).unwrap();
            assert!(faults.is_empty());
        });
    });
}

criterion_group! {
    name = pipeline;
    config = Criterion::default().without_plots().sample_size(20);
    targets = dashboard_pipeline, replay, audit
}

criterion_main!(pipeline);
