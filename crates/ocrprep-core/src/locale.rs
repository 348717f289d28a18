//! User-facing message catalog
//!
//! The setup procedure talks to the user in English or Simplified Chinese.
//! Only the wording differs between the two; the steps are identical.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::BootstrapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Locale {
    #[default]
    #[serde(rename = "en", alias = "english")]
    English,
    #[serde(rename = "zh", alias = "zh-cn", alias = "chinese")]
    Chinese,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Chinese => "zh",
        }
    }

    pub fn messages(&self) -> Messages {
        Messages { locale: *self }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = BootstrapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "english" => Ok(Locale::English),
            "zh" | "zh-cn" | "zh_cn" | "chinese" => Ok(Locale::Chinese),
            other => Err(BootstrapError::Config(format!(
                "Unsupported locale '{}' (expected 'en' or 'zh')",
                other
            ))),
        }
    }
}

/// Localized lines printed by the procedure
#[derive(Debug, Clone, Copy)]
pub struct Messages {
    locale: Locale,
}

impl Messages {
    fn pick(&self, en: &str, zh: &str) -> String {
        match self.locale {
            Locale::English => en.to_string(),
            Locale::Chinese => zh.to_string(),
        }
    }

    pub fn banner(&self) -> String {
        self.pick("DeepSeek-OCR environment setup", "DeepSeek-OCR 环境配置")
    }

    pub fn step(&self, index: usize, total: usize, title: &str) -> String {
        format!("[{}/{}] {}", index, total, title)
    }

    pub fn checking_python(&self) -> String {
        self.pick("Checking Python installation...", "检查 Python 安装...")
    }

    pub fn python_found(&self, version: &str) -> String {
        match self.locale {
            Locale::English => format!("Found {}", version),
            Locale::Chinese => format!("已找到 {}", version),
        }
    }

    pub fn python_missing(&self, download_url: &str) -> Vec<String> {
        match self.locale {
            Locale::English => vec![
                "ERROR: Python was not found. Please install Python 3.8 or newer.".to_string(),
                format!("Download: {}", download_url),
            ],
            Locale::Chinese => vec![
                "错误: 未找到 Python，请先安装 Python 3.8 或更高版本。".to_string(),
                format!("下载地址: {}", download_url),
            ],
        }
    }

    pub fn checking_env(&self) -> String {
        self.pick("Preparing virtual environment...", "准备虚拟环境...")
    }

    pub fn env_exists(&self) -> String {
        self.pick(
            "Virtual environment already exists, skipping creation",
            "虚拟环境已存在，跳过创建",
        )
    }

    pub fn env_created(&self) -> String {
        self.pick("Virtual environment created", "虚拟环境创建成功")
    }

    pub fn env_failed(&self) -> String {
        self.pick(
            "ERROR: Failed to create the virtual environment",
            "错误: 创建虚拟环境失败",
        )
    }

    pub fn installing_deps(&self) -> String {
        self.pick("Installing dependencies...", "安装依赖...")
    }

    pub fn upgrading_pip(&self) -> String {
        self.pick("Upgrading pip...", "升级 pip...")
    }

    pub fn installing_accelerated(&self) -> String {
        self.pick(
            "Installing PyTorch (CUDA build)...",
            "安装 PyTorch (CUDA 版本)...",
        )
    }

    pub fn accelerated_failed(&self) -> String {
        self.pick(
            "WARNING: CUDA build failed to install, trying the CPU build...",
            "警告: CUDA 版本安装失败，尝试安装 CPU 版本...",
        )
    }

    pub fn fallback_failed(&self) -> String {
        self.pick(
            "WARNING: CPU build failed to install as well, continuing",
            "警告: CPU 版本也安装失败，继续执行",
        )
    }

    pub fn installing_manifest(&self) -> String {
        self.pick(
            "Installing remaining requirements...",
            "安装其余依赖...",
        )
    }

    pub fn manifest_failed(&self) -> String {
        self.pick("ERROR: Failed to install dependencies", "错误: 依赖安装失败")
    }

    pub fn deps_installed(&self) -> String {
        self.pick("Dependencies installed", "依赖安装完成")
    }

    pub fn downloading_models(&self) -> String {
        self.pick("Downloading models...", "下载模型...")
    }

    pub fn models_ready(&self) -> String {
        self.pick("Models downloaded", "模型下载完成")
    }

    pub fn models_incomplete(&self, manual_url: &str) -> Vec<String> {
        match self.locale {
            Locale::English => vec![
                "WARNING: Model download did not complete.".to_string(),
                "You can re-run the setup to resume the download,".to_string(),
                format!("or download the files manually from {}", manual_url),
            ],
            Locale::Chinese => vec![
                "警告: 模型下载未完成。".to_string(),
                "您可以重新运行安装程序继续下载，".to_string(),
                format!("或手动访问 {} 下载", manual_url),
            ],
        }
    }

    pub fn complete(&self) -> String {
        self.pick("Setup complete!", "安装完成!")
    }

    pub fn usage(&self) -> Vec<String> {
        match self.locale {
            Locale::English => vec![
                "Usage:".to_string(),
                "  run_ocr.bat <image>          run OCR on an image".to_string(),
                "  env\\Scripts\\python run_ocr.py <image>".to_string(),
            ],
            Locale::Chinese => vec![
                "使用方法:".to_string(),
                "  run_ocr.bat <图片>            识别图片中的文字".to_string(),
                "  env\\Scripts\\python run_ocr.py <图片>".to_string(),
            ],
        }
    }

    pub fn setup_aborted(&self) -> String {
        self.pick("Setup aborted.", "安装已中止。")
    }

    pub fn press_enter(&self) -> String {
        self.pick("Press Enter to exit", "按回车键退出")
    }

    pub fn download_cancelled(&self) -> String {
        self.pick("Download cancelled", "下载已取消")
    }

    pub fn download_summary(&self, succeeded: usize, total: usize) -> String {
        match self.locale {
            Locale::English => format!("{}/{} model files present", succeeded, total),
            Locale::Chinese => format!("模型文件 {}/{} 已就绪", succeeded, total),
        }
    }

    pub fn failed_files(&self) -> String {
        self.pick("Files that could not be downloaded:", "以下文件下载失败:")
    }

    /// One line of `ocrprep status` output
    pub fn status_entry(&self, label: &str, detail: &str, present: bool) -> String {
        let mark = match (self.locale, present) {
            (Locale::English, true) => "ok",
            (Locale::English, false) => "missing",
            (Locale::Chinese, true) => "正常",
            (Locale::Chinese, false) => "缺失",
        };
        format!("  [{}] {}: {}", mark, label, detail)
    }
}
