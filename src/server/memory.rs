//! # Memoria Disponible
//! src/server/memory.rs
//!
//! Sonda de memoria libre para la admisión de conexiones. Un worker no
//! atiende una conexión si el sistema no tiene un mínimo de memoria libre.

use std::fs;

/// Fuente de la memoria disponible
pub trait MemoryProbe: Send + Sync {
    /// Bytes disponibles, `None` si no se pueden conocer
    fn available(&self) -> Option<u64>;
}

/// Lee `MemAvailable` de `/proc/meminfo`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMemory;

impl MemoryProbe for SystemMemory {
    fn available(&self) -> Option<u64> {
        let meminfo = fs::read_to_string("/proc/meminfo").ok()?;
        parse_meminfo(&meminfo)
    }
}

/// Sonda con un valor fijo (útil para pruebas y para desactivar la admisión)
#[derive(Debug, Clone, Copy)]
pub struct FixedMemory(pub Option<u64>);

impl MemoryProbe for FixedMemory {
    fn available(&self) -> Option<u64> {
        self.0
    }
}

/// Extrae `MemAvailable: <n> kB` en bytes
fn parse_meminfo(meminfo: &str) -> Option<u64> {
    let line = meminfo.lines().find(|line| line.starts_with("MemAvailable:"))?;
    let mut words = line["MemAvailable:".len()..].split_whitespace();
    let value: u64 = words.next()?.parse().ok()?;
    match words.next() {
        Some(unit) if unit.eq_ignore_ascii_case("kB") => Some(value.saturating_mul(1024)),
        _ => Some(value),
    }
}

/// Verifica que haya al menos `threshold` bytes (desconocido cuenta como suficiente)
pub fn is_adequate(probe: &dyn MemoryProbe, threshold: u64) -> bool {
    probe.available().map_or(true, |available| available >= threshold)
}
