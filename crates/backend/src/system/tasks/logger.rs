use anyhow::Result;
use chrono::Utc;
use std::io::Write;
use std::path::PathBuf;

/// Пишет журнал каждого запуска задания в отдельный файл сессии
pub struct TaskLogger {
    log_dir: PathBuf,
}

impl TaskLogger {
    pub fn new(log_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&log_dir)?;
        Ok(Self { log_dir })
    }

    pub fn get_log_file_path(&self, session_id: &str) -> String {
        self.log_dir
            .join(format!("{}.log", session_id))
            .to_string_lossy()
            .to_string()
    }

    pub fn write_log(&self, session_id: &str, message: &str) -> Result<()> {
        let path = self.log_dir.join(format!("{}.log", session_id));
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "[{}] {}", Utc::now().format("%Y-%m-%d %H:%M:%S"), message)?;
        Ok(())
    }
}
