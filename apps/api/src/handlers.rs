pub mod access;
pub mod dashboard;
pub mod health;
pub mod roles;
pub mod session;

#[cfg(test)]
mod tests;
