pub mod backup;
pub mod down;
pub mod logs;
pub mod ps;
pub mod restart;
pub mod restore;
pub mod start;
pub mod stop;
pub mod up;
pub mod validate;
