pub mod cart;
pub mod diary;
pub mod health;
pub mod order;
