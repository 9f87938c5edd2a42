pub mod directory;
pub mod numeric;
pub mod tasks;
pub mod wiql;
pub mod work_days;
