use askama_axum::Template;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub daily_limit: u32,
}

#[derive(Template)]
#[template(path = "merge.html")]
pub struct MergeTemplate {
    pub remaining: u32,
    pub daily_limit: u32,
    pub resets_in: String,
    pub max_upload_mb: usize,
}

#[derive(Template)]
#[template(path = "protect.html")]
pub struct ProtectTemplate {
    pub remaining: u32,
    pub daily_limit: u32,
    pub resets_in: String,
    pub max_upload_mb: usize,
}
