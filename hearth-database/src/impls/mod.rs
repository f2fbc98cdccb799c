pub mod cooldown;
pub mod prefix;
