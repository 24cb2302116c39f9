pub mod stage1_filter;
pub mod stage2_baseline;
pub mod stage3_change;
pub mod stage4_fit;
pub mod stage5_contrasts;
pub mod stage6_report;
