use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// 中断信号来源
///
/// `next` 在收到一次中断时返回 `Some(())`，来源关闭时返回 `None`
pub trait Interrupts: Send + 'static {
    fn next(&mut self) -> impl Future<Output = Option<()>> + Send;
}

#[cfg(unix)]
type Signal = tokio::signal::unix::Signal;
#[cfg(windows)]
type Signal = tokio::signal::windows::CtrlC;

/// 进程的 Ctrl-C / SIGINT
///
/// 只注册一次，两次 `next` 之间到达的中断不会丢失
pub struct CtrlC {
    signal: Option<Signal>,
}

impl CtrlC {
    pub fn new() -> Self {
        #[cfg(unix)]
        let signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt());
        #[cfg(windows)]
        let signal = tokio::signal::windows::ctrl_c();

        match signal {
            Ok(signal) => Self {
                signal: Some(signal),
            },
            Err(e) => {
                warn!("Failed to listen for interrupts: {}", e);
                Self { signal: None }
            }
        }
    }
}

impl Interrupts for CtrlC {
    fn next(&mut self) -> impl Future<Output = Option<()>> + Send {
        async move {
            match &mut self.signal {
                Some(signal) => signal.recv().await,
                None => None,
            }
        }
    }
}

/// 两段式退出控制
///
/// 第一次中断取消 `token()`，截图流程在下一个检查点停止；
/// 第二次中断执行强制退出动作。
pub struct Shutdown {
    cancel: CancellationToken,
    done: CancellationToken,
    listener: JoinHandle<()>,
}

impl Shutdown {
    /// 监听 Ctrl-C，第二次中断时以状态码 1 退出进程
    pub fn install() -> Self {
        Self::with_interrupts(CtrlC::new(), || std::process::exit(1))
    }

    pub fn with_interrupts<I, F>(interrupts: I, force_exit: F) -> Self
    where
        I: Interrupts,
        F: FnOnce() + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let done = CancellationToken::new();
        let listener = tokio::spawn(Self::listen(
            interrupts,
            cancel.clone(),
            done.clone(),
            force_exit,
        ));

        Self {
            cancel,
            done,
            listener,
        }
    }

    /// 截图流程观察的取消信号
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 命令结束后停止监听
    pub async fn release(self) {
        self.done.cancel();
        if let Err(e) = self.listener.await {
            warn!("Interrupt listener ended abnormally: {}", e);
        }
        debug!("Interrupt listener released");
    }

    async fn listen<I, F>(
        mut interrupts: I,
        cancel: CancellationToken,
        done: CancellationToken,
        force_exit: F,
    ) where
        I: Interrupts,
        F: FnOnce(),
    {
        tokio::select! {
            received = interrupts.next() => {
                if received.is_none() {
                    return;
                }
                warn!("Interrupt received, stopping after the current display (interrupt again to force exit)");
                cancel.cancel();
            }
            _ = done.cancelled() => return,
        }

        tokio::select! {
            received = interrupts.next() => {
                if received.is_some() {
                    error!("Second interrupt received, exiting");
                    force_exit();
                }
            }
            _ = done.cancelled() => {}
        }
    }
}
