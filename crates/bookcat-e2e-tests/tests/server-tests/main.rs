mod rest_author;
mod rest_book;
mod server_health;
mod statistics;
