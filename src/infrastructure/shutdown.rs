//! 停止信号 - 基础设施层
//!
//! Ctrl-C 只会取消令牌，由运行器在两条推文之间或冷却期间自行退出，
//! 保证进度文件中不会出现写了一半的行。

use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// 注册 Ctrl-C 监听，返回收到信号时被取消的令牌
pub fn install_ctrl_c_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("⚠️ 收到 Ctrl-C，当前推文处理完后停止");
                trigger.cancel();
            }
            Err(e) => {
                error!("无法监听 Ctrl-C 信号: {}", e);
            }
        }
    });

    token
}
