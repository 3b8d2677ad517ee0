pub mod company;
pub mod installation;
pub mod inventory_item;
pub mod item_master;
pub mod item_service_rule;
pub mod item_warranty_rule;
pub mod maintenance_record;
pub mod service_follow_up;
pub mod service_form_entry;
pub mod spare_part_usage;
pub mod warranty_follow_up;
pub mod working_hours;
