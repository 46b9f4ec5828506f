//! Minimal open / insert / get / close round trip.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p sqlite-driver-demos --example users
//! ```

use sqlite_driver::{Driver, Filter, Schema, record};

record! {
    table = "users",
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct User {
        pub id: u32 => [primary_key()],
        pub money: u32,
    }
}

fn main() {
    let path = std::env::temp_dir().join("sqlite_driver_users.sqlite");
    let _ = std::fs::remove_file(&path);

    // Open the database; the users table is created on first run.
    let driver = Driver::open_path(&path, Schema::new().with::<User>()).unwrap();

    driver.insert(&User { id: 1, money: 0 }).unwrap();

    let user = driver
        .get::<User>(Filter::new().eq("id", 1))
        .unwrap()
        .unwrap();
    println!("User id {} with money {}", user.id, user.money);

    driver.close().unwrap();
    let _ = std::fs::remove_file(&path);
}
