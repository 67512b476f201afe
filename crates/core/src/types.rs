/// Backend account ids are integer primary keys (`id` / `id_cuenta`).
pub type UserId = i64;
