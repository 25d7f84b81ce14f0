pub mod repo_url;
