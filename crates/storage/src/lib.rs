pub mod db;

pub use db::{
    create_db, delete_meal, delete_member, delete_purchase, get_all_meals, get_all_members,
    get_all_purchases, get_member, get_purchase, insert_meal, insert_member, insert_purchase,
    insert_purchases, list_meals, list_purchases, update_meal, update_member, update_purchase,
    DbPool,
};
