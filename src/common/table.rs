// src/common/table.rs

//! Validated adapter from a C-style function-pointer capability table to the
//! [`I2cBus`] trait.
//!
//! Board support packages that hand out `{pfStart, pfStop, pfWaitAck, ...}`
//! tables plug in here: every required entry is checked once at bind time, so
//! no null pointer ever reaches a runtime call site. The register read/write
//! entries are optional conveniences; when present they become the driver's
//! register-level fast path.

use super::error::Aht21Error;
use super::hal_traits::{BusAck, I2cBus};

/// Transport fault code reported by a table entry (the C convention: zero is
/// success, negative values are fault codes).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TableFault(pub i8);

pub type InitFn = fn() -> i8;
pub type DeinitFn = fn() -> i8;
pub type StartFn = fn() -> i8;
pub type StopFn = fn() -> i8;
/// Returns 0 for ACK, positive for NACK, negative for a transport fault.
pub type WaitAckFn = fn() -> i8;
pub type SendByteFn = fn(u8) -> i8;
pub type ReadByteFn = fn() -> u8;
pub type SendAckFn = fn() -> i8;
pub type SendNackFn = fn() -> i8;
pub type WriteRegisterFn = fn(u8, &[u8]) -> i8;
pub type ReadRegisterFn = fn(u8, &mut [u8]) -> i8;

/// Capability table as supplied by the platform. All byte-level entries are
/// mandatory; `write_register`/`read_register` may be absent.
#[derive(Debug, Default, Copy, Clone)]
pub struct TransportTable {
    pub init: Option<InitFn>,
    pub deinit: Option<DeinitFn>,
    pub start: Option<StartFn>,
    pub stop: Option<StopFn>,
    pub wait_ack: Option<WaitAckFn>,
    pub send_byte: Option<SendByteFn>,
    pub read_byte: Option<ReadByteFn>,
    pub send_ack: Option<SendAckFn>,
    pub send_nack: Option<SendNackFn>,
    pub write_register: Option<WriteRegisterFn>,
    pub read_register: Option<ReadRegisterFn>,
}

impl TransportTable {
    /// Validates the table and binds it into a trait-backed transport.
    ///
    /// Fails with [`Aht21Error::MissingCapability`] naming the first absent
    /// required entry.
    pub fn bind(self) -> Result<TableTransport, Aht21Error> {
        Ok(TableTransport {
            init: self.init.ok_or(Aht21Error::MissingCapability("init"))?,
            deinit: self.deinit.ok_or(Aht21Error::MissingCapability("deinit"))?,
            start: self.start.ok_or(Aht21Error::MissingCapability("start"))?,
            stop: self.stop.ok_or(Aht21Error::MissingCapability("stop"))?,
            wait_ack: self
                .wait_ack
                .ok_or(Aht21Error::MissingCapability("wait_ack"))?,
            send_byte: self
                .send_byte
                .ok_or(Aht21Error::MissingCapability("send_byte"))?,
            read_byte: self
                .read_byte
                .ok_or(Aht21Error::MissingCapability("read_byte"))?,
            send_ack: self
                .send_ack
                .ok_or(Aht21Error::MissingCapability("send_ack"))?,
            send_nack: self
                .send_nack
                .ok_or(Aht21Error::MissingCapability("send_nack"))?,
            write_register: self.write_register,
            read_register: self.read_register,
        })
    }
}

/// A fully validated capability table. Every required function pointer is
/// guaranteed present.
#[derive(Debug, Copy, Clone)]
pub struct TableTransport {
    init: InitFn,
    deinit: DeinitFn,
    start: StartFn,
    stop: StopFn,
    wait_ack: WaitAckFn,
    send_byte: SendByteFn,
    read_byte: ReadByteFn,
    send_ack: SendAckFn,
    send_nack: SendNackFn,
    write_register: Option<WriteRegisterFn>,
    read_register: Option<ReadRegisterFn>,
}

fn check(code: i8) -> Result<(), TableFault> {
    if code < 0 {
        Err(TableFault(code))
    } else {
        Ok(())
    }
}

impl I2cBus for TableTransport {
    type Error = TableFault;

    fn init(&mut self) -> Result<(), TableFault> {
        check((self.init)())
    }

    fn deinit(&mut self) -> Result<(), TableFault> {
        check((self.deinit)())
    }

    fn start(&mut self) -> Result<(), TableFault> {
        check((self.start)())
    }

    fn stop(&mut self) -> Result<(), TableFault> {
        check((self.stop)())
    }

    fn wait_ack(&mut self) -> nb::Result<BusAck, TableFault> {
        // Table entries block internally; WouldBlock never surfaces here.
        match (self.wait_ack)() {
            0 => Ok(BusAck::Ack),
            code if code > 0 => Ok(BusAck::Nack),
            code => Err(nb::Error::Other(TableFault(code))),
        }
    }

    fn send_byte(&mut self, byte: u8) -> nb::Result<(), TableFault> {
        check((self.send_byte)(byte)).map_err(nb::Error::Other)
    }

    fn read_byte(&mut self) -> nb::Result<u8, TableFault> {
        Ok((self.read_byte)())
    }

    fn send_ack(&mut self) -> Result<(), TableFault> {
        check((self.send_ack)())
    }

    fn send_nack(&mut self) -> Result<(), TableFault> {
        check((self.send_nack)())
    }

    fn write_register(&mut self, device: u8, payload: &[u8]) -> Option<Result<(), TableFault>> {
        let f = self.write_register?;
        Some(check(f(device, payload)))
    }

    fn read_register(&mut self, device: u8, buffer: &mut [u8]) -> Option<Result<(), TableFault>> {
        let f = self.read_register?;
        Some(check(f(device, buffer)))
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn ok_code() -> i8 {
        0
    }
    fn nack_code() -> i8 {
        1
    }
    fn fault_code() -> i8 {
        -3
    }
    fn take_byte(_byte: u8) -> i8 {
        0
    }
    fn give_byte() -> u8 {
        0xA5
    }

    fn full_table() -> TransportTable {
        TransportTable {
            init: Some(ok_code),
            deinit: Some(ok_code),
            start: Some(ok_code),
            stop: Some(ok_code),
            wait_ack: Some(ok_code),
            send_byte: Some(take_byte),
            read_byte: Some(give_byte),
            send_ack: Some(ok_code),
            send_nack: Some(ok_code),
            write_register: None,
            read_register: None,
        }
    }

    #[test]
    fn test_full_table_binds() {
        let mut bus = full_table().bind().unwrap();
        assert_eq!(bus.read_byte(), Ok(0xA5));
        assert_eq!(bus.wait_ack(), Ok(BusAck::Ack));
        assert!(bus.write_register(0x38, &[0xAC]).is_none());
    }

    #[test]
    fn test_missing_required_entry_is_named() {
        let mut table = full_table();
        table.wait_ack = None;
        assert_eq!(
            table.bind().err(),
            Some(Aht21Error::MissingCapability("wait_ack"))
        );

        let mut table = full_table();
        table.send_byte = None;
        assert_eq!(
            table.bind().err(),
            Some(Aht21Error::MissingCapability("send_byte"))
        );
    }

    #[test]
    fn test_optional_register_entries_may_be_absent() {
        // Default-constructed table has no register entries and still fails
        // only on the first *required* gap.
        let table = TransportTable {
            write_register: None,
            read_register: None,
            ..full_table()
        };
        assert!(table.bind().is_ok());
    }

    #[test]
    fn test_ack_code_mapping() {
        let mut table = full_table();
        table.wait_ack = Some(nack_code);
        let mut bus = table.bind().unwrap();
        assert_eq!(bus.wait_ack(), Ok(BusAck::Nack));

        let mut table = full_table();
        table.wait_ack = Some(fault_code);
        let mut bus = table.bind().unwrap();
        assert_eq!(bus.wait_ack(), Err(nb::Error::Other(TableFault(-3))));
    }

    #[test]
    fn test_register_fast_path_is_exposed() {
        fn reg_write(device: u8, payload: &[u8]) -> i8 {
            if device == 0x38 && !payload.is_empty() {
                0
            } else {
                -1
            }
        }
        let table = TransportTable {
            write_register: Some(reg_write),
            ..full_table()
        };
        let mut bus = table.bind().unwrap();
        assert_eq!(bus.write_register(0x38, &[0xAC, 0x33, 0x00]), Some(Ok(())));
        assert_eq!(
            bus.write_register(0x39, &[0xAC]),
            Some(Err(TableFault(-1)))
        );
    }
}
