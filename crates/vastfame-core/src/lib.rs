//! Vast Fame GBA cartridge scrambler emulation.
//!
//! Vast Fame cartridges hide their battery-backed SRAM (and unmapped ROM
//! regions) behind an undocumented mapper chip: SRAM addresses and data
//! bytes are bit-permuted according to modes latched by a secret write
//! sequence, and ROM reads past the image return address-derived pattern
//! values that the games' protection checks depend on. This crate contains
//! the platform-agnostic chip logic; the memory-bus dispatcher, ROM/SRAM
//! buffers and frontends live in the host emulator and drive it per access.

/// Cartridge variant detection and the scrambler's bus-facing state machine.
pub mod cartridge;

/// Synthetic pattern values for ROM reads outside the image.
pub mod pattern;

/// Bit-reordering engine and the fixed permutation tables.
pub mod scramble;
