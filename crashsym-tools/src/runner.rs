//! 外部コマンドの実行

use crate::Result;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// 外部コマンドの実行エラー
#[derive(Debug, Error)]
pub enum ToolError {
    /// コマンドを起動できなかった（未インストールなど）
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// コマンドが異常終了した
    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// 外部コマンドを同期的に実行し、標準出力を返す
///
/// タイムアウトはありません。コマンドが終了しない場合は呼び出し元も戻りません。
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, program: &str, args: &[String]) -> Result<String> {
        (**self).run(program, args)
    }
}

/// 実際にプロセスを起動するランナー
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String> {
        debug!("running {} {:?}", program, args);

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| ToolError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                program: program.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_stdout() {
        let out = SystemRunner.run("echo", &["hello".to_string()]).unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn test_run_missing_program() {
        let err = SystemRunner
            .run("crashsym-no-such-program", &[])
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolError>(),
            Some(ToolError::Spawn { .. })
        ));
    }

    #[test]
    fn test_run_failed_status() {
        let err = SystemRunner.run("false", &[]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolError>(),
            Some(ToolError::Failed { .. })
        ));
    }
}
