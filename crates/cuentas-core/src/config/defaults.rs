// --- Default value functions ---

pub(super) fn default_name() -> String {
    "Cuentas".to_string()
}
pub(super) fn default_data_dir() -> String {
    "~/.cuentas".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_backend_url() -> String {
    "http://localhost:8000/api".to_string()
}
pub(super) fn default_backend_timeout() -> u64 {
    15
}
pub(super) fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
pub(super) fn default_classifier_model() -> String {
    "gpt-4o-mini".to_string()
}
pub(super) fn default_humanizer_min_length() -> usize {
    120
}
pub(super) fn default_sweep_interval() -> u64 {
    300
}
pub(super) fn default_audit_db_path() -> String {
    "~/.cuentas/data/audit.db".to_string()
}
pub(super) fn default_true() -> bool {
    true
}
