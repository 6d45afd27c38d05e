use anyhow::Result;
use armplan_core::config::Config;

pub fn run(config: Config, port: u16, open: bool) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        let actual_port = listener.local_addr()?.port();
        println!("armplan → http://localhost:{actual_port}");

        tokio::select! {
            res = armplan_server::serve_on(config, listener, open) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}
