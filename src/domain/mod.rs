pub mod month;
pub mod new_subscription;
pub mod price;
pub mod service_name;
pub mod subscription;
