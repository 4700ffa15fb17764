//! Vast Fame cartridge state and the bus-facing scrambler operations.
//!
//! The bus dispatcher calls [`VastFameCart::detect`] once per loaded image,
//! routes every ROM read through [`VastFameCart::map_rom_address`] (falling
//! back to the pattern generator past the image) and every SRAM write
//! through [`VastFameCart::sram_write`].

use log::info;

use crate::pattern;
use crate::scramble;

/// ARM init-routine fragment present at 0x15C in every known Vast Fame ROM.
const INIT_SEQUENCE: [u8; 16] = [
    0xB4, 0x00, 0x9F, 0xE5, 0x99, 0x10, 0xA0, 0xE3, 0x00, 0x10, 0xC0, 0xE5, 0xAC, 0x00, 0x9F, 0xE5,
];

/// Writing this to SRAM FFF8-FFFC arms "mode change" mode.
const MODE_CHANGE_START_SEQUENCE: [u8; 5] = [0x99, 0x02, 0x05, 0x02, 0x03];
/// Writing this to SRAM FFF8-FFFC disarms it again.
const MODE_CHANGE_END_SEQUENCE: [u8; 5] = [0x99, 0x03, 0x62, 0x02, 0x56];

/// Which scrambling parameter family a cartridge uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CartVariant {
    /// No scrambler chip detected; nothing is remapped or reordered.
    #[default]
    None,
    /// The common Vast Fame hardware.
    Standard,
    /// George Sango boards: identical init code, different reorder tables
    /// in the cart hardware itself. Other undumped games may differ too.
    George,
}

/// Per-cartridge scrambler state.
///
/// One instance per loaded image, owned by the emulator session and
/// mutated on every relevant bus access. Plain `Copy` data so host
/// save-states and rewind can snapshot it wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VastFameCart {
    pub variant: CartVariant,
    /// Latched SRAM mode register. `None` until a game latches one; SRAM
    /// writes are dropped until then. Only the low nibble selects schemes.
    pub sram_mode: Option<u8>,
    /// Latched ROM mode register. Only initialized-vs-not affects mapping.
    pub rom_mode: Option<u8>,
    /// Whether writes to the mode registers are currently accepted.
    pub accepting_mode_change: bool,
    /// Last value written to each of the five magic window offsets.
    write_sequence: [u8; 5],
}

impl VastFameCart {
    pub fn new() -> Self {
        Self {
            variant: CartVariant::None,
            sram_mode: None,
            rom_mode: None,
            accepting_mode_change: false,
            write_sequence: [0; 5],
        }
    }

    /// Classify the loaded ROM image. Runs once at load time.
    pub fn detect(&mut self, rom: &[u8]) {
        self.variant = CartVariant::None;

        // The init code is also present & run in deprotected 32MB reprint
        // dumps of Digimon Ruby & Sapphire, which would break in scrambled
        // mode. No real Vast Fame game is this size.
        if rom.len() == 0x2000000 {
            return;
        }

        if rom.get(0x15C..0x16C) == Some(&INIT_SEQUENCE[..]) {
            self.variant = CartVariant::Standard;
            info!("Vast Fame game detected");
        }

        // Same init sequence, but the cart hardware ships a different set
        // of SRAM modes.
        if rom.get(0xA0..0xAC) == Some(&b"George Sango"[..]) {
            self.variant = CartVariant::George;
            info!("George mode");
        }
    }

    /// Resolve a ROM bus address to a physical image address. The caller
    /// still clamps the result against the actual image length.
    pub fn map_rom_address(&self, address: u32, rom_size: usize) -> u32 {
        if self.rom_mode.is_none() && address <= 0x08FFFFFF {
            // Until a ROM mode is latched only the first 0x80000 bytes are
            // readable. All known games latch mode 00, which opens the full
            // range; other values are unexplored.
            address & 0x7FFFF
        } else if in_mirrored_area(address, rom_size) {
            address - 0x800000
        } else {
            address
        }
    }

    /// Read a halfword from ROM space, synthesizing a pattern value when
    /// the mapped offset falls outside the image.
    pub fn rom_read16(&self, rom: &[u8], address: u32) -> u16 {
        let mapped = self.map_rom_address(address, rom.len());
        let offset = (mapped & 0x01FFFFFF & !1) as usize;
        match rom.get(offset..offset + 2) {
            Some(bytes) => u16::from_le_bytes([bytes[0], bytes[1]]),
            None => pattern::pattern_value16(address),
        }
    }

    /// Apply one SRAM bus write: update the mode state machine, then pass
    /// the write through the scrambler into `sram`.
    ///
    /// `sram.len()` must be a power of two; every store is masked by it.
    pub fn sram_write(&mut self, address: u32, value: u8, sram: &mut [u8]) {
        debug_assert!(sram.len().is_power_of_two());

        // A certain sequence of writes to SRAM FFF8-FFFC enables or
        // disables "mode change" mode. Each offset keeps the last byte
        // written to it; the comparison fires on a write to the final
        // offset. Whether the writes must be sequential is unknown.
        if (0x0E00FFF8..=0x0E00FFFC).contains(&address) {
            self.write_sequence[(address - 0x0E00FFF8) as usize] = value;
            if address == 0x0E00FFFC {
                if self.write_sequence == MODE_CHANGE_START_SEQUENCE {
                    self.accepting_mode_change = true;
                }
                if self.write_sequence == MODE_CHANGE_END_SEQUENCE {
                    self.accepting_mode_change = false;
                }
            }
        }

        // While in "mode change" mode either the SRAM or ROM mode can be
        // latched. What other SRAM writes should do here is unknown.
        if self.accepting_mode_change {
            if address == 0x0E00FFFE {
                self.sram_mode = Some(value);
            } else if address == 0x0E00FFFD {
                self.rom_mode = Some(value);
            }
        }

        // SRAM is not writable until a mode has been latched.
        let Some(mode) = self.sram_mode else {
            return;
        };

        let mut target = scramble::sram_address(self.variant, address, mode);
        let value = scramble::sram_value(self.variant, value, mode);
        if target >= 0x0E008000 {
            target -= 0x8000;
        }
        // Writes land mirrored across the 0x8000 boundary.
        let mask = sram.len() - 1;
        sram[target as usize & mask] = value;
        sram[(target as usize + 0x8000) & mask] = value;
    }
}

impl Default for VastFameCart {
    fn default() -> Self {
        Self::new()
    }
}

// Known 4m games (Zook, Sango) mirror the image at 800000; the 8m Digimon
// Ruby does not.
fn in_mirrored_area(address: u32, rom_size: usize) -> bool {
    rom_size == 0x400000
        && address >= 0x08800000
        && address < 0x08800000 + rom_size as u32
}
