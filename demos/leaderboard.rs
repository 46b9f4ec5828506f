//! Sorting, ranking, update operations, JSON columns, and migration.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=sqlite_driver=debug cargo run -p sqlite-driver-demos --example leaderboard
//! ```

use serde::{Deserialize, Serialize};
use sqlite_driver::{
    Driver, DriverConfig, Filter, Query, Schema, Sort, SortOperator, UpdateOp, json_field, record,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    pub weapon: String,
    pub perks: Vec<String>,
}

json_field!(Loadout);

mod first_release {
    sqlite_driver::record! {
        table = "players",
        #[derive(Debug, Default, Clone, PartialEq)]
        pub struct Player {
            pub id: u32 => [primary_key()],
            pub name: String => [not_null()],
            pub kills: u32,
        }
    }
}

record! {
    table = "players",
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Player {
        pub id: u32 => [primary_key()],
        pub name: String => [not_null()],
        pub kills: u32,
        pub deaths: u32 => [not_null()],
        pub online: bool => [not_null()],
        pub loadout: Loadout,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = std::env::temp_dir().join("sqlite_driver_leaderboard.sqlite");
    let _ = std::fs::remove_file(&path);
    let config = DriverConfig::new(&path);

    // === First release: kills only ===
    let driver = Driver::from_config(&config, Schema::new().with::<first_release::Player>()).unwrap();
    for (id, name, kills) in [(1, "ann", 12), (2, "bob", 7), (3, "cy", 20)] {
        driver
            .insert(&first_release::Player {
                id,
                name: name.to_string(),
                kills,
            })
            .unwrap();
    }
    driver.close().unwrap();

    // === Second release: new columns are appended on open ===
    let driver = Driver::from_config(&config, Schema::new().with::<Player>()).unwrap();
    for change in &driver.report().migrated {
        println!("{}: added {:?}", change.table, change.added);
    }

    driver
        .update::<Player>(
            vec![UpdateOp::add("deaths", 4), UpdateOp::set("online", true)],
            Filter::new().eq("name", "cy"),
        )
        .unwrap();
    driver
        .update::<Player>(vec![UpdateOp::add("deaths", 1)], Filter::new().ne("name", "cy"))
        .unwrap();

    let inserted = driver
        .upsert(
            &Player {
                id: 4,
                name: "dee".to_string(),
                kills: 15,
                deaths: 0,
                online: true,
                loadout: Loadout {
                    weapon: "bow".to_string(),
                    perks: vec!["eagle eye".to_string()],
                },
            },
            Filter::new().eq("id", 4),
        )
        .unwrap();
    println!("dee inserted: {inserted}");

    // === Ranking by kills - deaths ===
    let score = Sort::desc_by(["kills", "deaths"], SortOperator::Minus);
    println!("\n=== Leaderboard ===");
    for player in driver.all::<Player>(Query::new().sort(score.clone())).unwrap() {
        println!(
            "{:<4} {:>3} kills {:>3} deaths  online={} weapon={:?}",
            player.name, player.kills, player.deaths, player.online, player.loadout.weapon
        );
    }

    let rank = driver
        .row_position::<Player>(Query::new().filter(Filter::new().eq("name", "ann")).sort(score))
        .unwrap();
    println!("\nann is ranked {rank:?}");

    let online = driver
        .row_count::<Player>(Filter::new().eq("online", true))
        .unwrap();
    println!("{online} players online");

    driver.close().unwrap();
    let _ = std::fs::remove_file(&path);
}
