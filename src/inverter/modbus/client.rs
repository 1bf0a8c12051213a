//! Modbus TCP connection lifecycle (spec §4.9 "Connection lifecycle",
//! §9 "Ownership of connections"). Grounded on the teacher's
//! `modbus::client::ModbusClient` (an `Arc<Mutex<Context>>` singleton
//! with `set_slave` per call), extended with the lazy-connect, gated,
//! drop-on-error behavior the spec requires.

use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use tokio::sync::Mutex;
use tokio::time::{timeout, Instant};
use tokio_modbus::client::{tcp, Context};
use tokio_modbus::prelude::*;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const INTER_OP_GATE: Duration = Duration::from_secs(1);

/// A lazily-established, singleton TCP connection. Any operation error
/// drops the held context so the next call reconnects from scratch.
pub struct ModbusConnection {
    host: String,
    port: u16,
    unit_id: u8,
    response_timeout: Duration,
    ctx: Mutex<Option<Context>>,
    last_op: Mutex<Option<Instant>>,
}

impl ModbusConnection {
    pub fn new(host: impl Into<String>, port: u16, unit_id: u8, response_timeout_ms: u64) -> Self {
        Self {
            host: host.into(),
            port,
            unit_id,
            response_timeout: Duration::from_millis(response_timeout_ms),
            ctx: Mutex::new(None),
            last_op: Mutex::new(None),
        }
    }

    async fn gate(&self) {
        let mut last = self.last_op.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < INTER_OP_GATE {
                tokio::time::sleep(INTER_OP_GATE - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn ensure_connected(&self, guard: &mut Option<Context>) -> Result<()> {
        if guard.is_some() {
            return Ok(());
        }
        let addr = format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid inverter address {}:{}", self.host, self.port))?;
        let mut new_ctx = timeout(CONNECT_TIMEOUT, tcp::connect(addr))
            .await
            .map_err(|_| anyhow!("modbus connect timed out after {CONNECT_TIMEOUT:?}"))??;
        new_ctx.set_slave(Slave(self.unit_id));
        *guard = Some(new_ctx);
        Ok(())
    }

    pub async fn read_holding_registers(&self, start: u16, count: u16) -> Result<Vec<u16>> {
        self.gate().await;
        let mut guard = self.ctx.lock().await;
        self.ensure_connected(&mut guard).await?;
        let ctx = guard.as_mut().expect("just connected");
        let outcome = timeout(self.response_timeout, ctx.read_holding_registers(start, count)).await;
        match outcome {
            Ok(Ok(values)) => Ok(values),
            Ok(Err(e)) => {
                *guard = None;
                Err(anyhow!(e).context("modbus read_holding_registers failed"))
            }
            Err(_) => {
                *guard = None;
                Err(anyhow!("modbus read timed out after {:?}", self.response_timeout))
            }
        }
    }

    pub async fn read_input_registers(&self, start: u16, count: u16) -> Result<Vec<u16>> {
        self.gate().await;
        let mut guard = self.ctx.lock().await;
        self.ensure_connected(&mut guard).await?;
        let ctx = guard.as_mut().expect("just connected");
        let outcome = timeout(self.response_timeout, ctx.read_input_registers(start, count)).await;
        match outcome {
            Ok(Ok(values)) => Ok(values),
            Ok(Err(e)) => {
                *guard = None;
                Err(anyhow!(e).context("modbus read_input_registers failed"))
            }
            Err(_) => {
                *guard = None;
                Err(anyhow!("modbus read timed out after {:?}", self.response_timeout))
            }
        }
    }

    pub async fn write_single_register(&self, addr: u16, value: u16) -> Result<()> {
        self.gate().await;
        let mut guard = self.ctx.lock().await;
        self.ensure_connected(&mut guard).await?;
        let ctx = guard.as_mut().expect("just connected");
        let outcome = timeout(self.response_timeout, ctx.write_single_register(addr, value)).await;
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                *guard = None;
                Err(anyhow!(e).context("modbus write_single_register failed"))
            }
            Err(_) => {
                *guard = None;
                Err(anyhow!("modbus write timed out after {:?}", self.response_timeout))
            }
        }
    }
}
