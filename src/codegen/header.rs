//! Header blob generation
//!
//! The image prelude is a sequence of data segments. Each segment opens with
//! a jump-over-data trampoline (a `GOTO` whose target is the next segment),
//! so a VM that blindly executes the file from byte zero skips every data
//! body and lands on code. Liberty and Miami carry three segments; SanAndreas
//! adds a streamed scripts directory and two trailing segments.
//!
//! The header's size is a closed-form expression over its inputs, so the
//! blob can be sized before any of it is emitted, and script layout can use
//! the header size before the header itself exists.

use crate::codegen::ByteSink;
use crate::ir::{Dialect, ScriptId, ScriptType};

/// Descriptor of the image prelude.
///
/// Mission and streamed script counts are derived from the script list at
/// construction, so the closed-form size and the emitted segments cannot
/// disagree.
pub struct ScmHeader<'a> {
    pub dialect: Dialect,

    /// Bytes reserved for global variables, including the 8 leading bytes
    /// occupied by the variables segment trampoline and target id.
    pub size_global_vars_space: u32,

    /// Model names referenced by the scripts, each at most 23 bytes plus the
    /// terminating NUL.
    pub models: Vec<String>,

    /// Every script of the program, in image order.
    pub scripts: Vec<ScriptId<'a>>,

    num_missions: u16,
    num_streamed: u32,
}

impl<'a> ScmHeader<'a> {
    pub fn new(
        dialect: Dialect,
        size_global_vars_space: u32,
        models: Vec<String>,
        scripts: Vec<ScriptId<'a>>,
    ) -> ScmHeader<'a> {
        assert!(
            size_global_vars_space >= 8,
            "global variable space cannot fit its own segment header"
        );

        let num_missions = scripts
            .iter()
            .filter(|script| script.script_type == ScriptType::Mission)
            .count();
        let num_streamed = scripts
            .iter()
            .filter(|script| script.script_type == ScriptType::StreamedScript)
            .count();

        ScmHeader {
            dialect,
            size_global_vars_space,
            models,
            scripts,
            num_missions: u16::try_from(num_missions).expect("mission count overflows u16"),
            num_streamed: num_streamed as u32,
        }
    }

    /// Size of the header blob in bytes.
    ///
    /// Every `8` below is one trampoline plus the segment's id byte.
    pub fn compiled_size(&self) -> usize {
        let size_globals = self.size_global_vars_space as usize;
        let base = 8
            + (size_globals - 8)
            + 8
            + 4
            + 24 * (1 + self.models.len())
            + 8
            + 4
            + 4
            + 2
            + 2
            + 4 * usize::from(self.num_missions);

        match self.dialect {
            Dialect::Liberty | Dialect::Miami => base,
            Dialect::SanAndreas => {
                base + 4
                    + 8
                    + 4
                    + 4
                    + 28 * (1 + self.num_streamed as usize)
                    + 8
                    + 4
                    + 8
                    + 4
                    + 1
                    + 1
                    + 2
            }
        }
    }

    /// Emit the header blob.
    ///
    /// Requires resolved script sizes, and placed offsets for missions.
    pub fn generate(&self) -> Vec<u8> {
        HeaderGenerator::new(self).generate()
    }
}

/// Emission state for one header blob.
struct HeaderGenerator<'h, 'a> {
    header: &'h ScmHeader<'a>,
    sink: ByteSink,
    next_seg_id: u8,
}

impl<'h, 'a> HeaderGenerator<'h, 'a> {
    fn new(header: &'h ScmHeader<'a>) -> HeaderGenerator<'h, 'a> {
        HeaderGenerator {
            header,
            sink: ByteSink::new(header.compiled_size()),
            next_seg_id: 0,
        }
    }

    /// Segment id byte. A running counter on SanAndreas, constant zero on
    /// the older dialects.
    fn seg_id(&mut self) -> u8 {
        match self.header.dialect {
            Dialect::SanAndreas => {
                let id = self.next_seg_id;
                self.next_seg_id += 1;
                id
            }
            _ => 0,
        }
    }

    /// Trampoline over a segment body of `skip_bytes` (the bytes behind the
    /// segment's id byte). `0x0002` is the target VM's GOTO.
    fn goto_over(&mut self, skip_bytes: usize) {
        let target = 8 + skip_bytes + self.sink.cursor();
        self.sink.emit_u16(0x0002);
        self.sink.emit_u8(0x01);
        self.sink.emit_i32(target as i32);
    }

    fn generate(mut self) -> Vec<u8> {
        let header = self.header;
        let head_size = header.compiled_size() as u32;

        // Sizes that depend on every script of the program.
        let mut main_size = head_size;
        let mut multifile_size = head_size;
        let mut largest_mission_size: u32 = 0;
        let mut largest_streamed_size: u32 = 0;
        let mut missions: Vec<ScriptId<'a>> = vec![];
        let mut streameds: Vec<ScriptId<'a>> = vec![];

        for &script in &header.scripts {
            let size = script.size.get().expect("script size not resolved");
            match script.script_type {
                ScriptType::Mission => {
                    missions.push(script);
                    multifile_size += size;
                    largest_mission_size = largest_mission_size.max(size);
                }
                ScriptType::StreamedScript => {
                    streameds.push(script);
                    largest_streamed_size = largest_streamed_size.max(size);
                }
                _ => {
                    main_size += size;
                    multifile_size += size;
                }
            }
        }
        debug_assert_eq!(missions.len(), usize::from(header.num_missions));
        debug_assert_eq!(streameds.len(), header.num_streamed as usize);

        // Variables segment. The global space owns the bytes behind the
        // target id, zeroed out.
        let size_globals = header.size_global_vars_space as usize;
        self.goto_over(size_globals - 8);
        self.sink.emit_i8(header.dialect.target_id());
        self.sink.emit_fill(size_globals - 8, 0);

        // Models segment. The first directory entry is reserved and blank.
        self.goto_over(4 + 24 * (1 + header.models.len()));
        let id = self.seg_id();
        self.sink.emit_u8(id);
        self.sink.emit_u32(1 + header.models.len() as u32);
        self.sink.emit_fill(24, 0);
        for model in &header.models {
            assert!(model.len() < 24, "model name does not fit its slot: {}", model);
            self.sink.emit_chars(24, model);
        }

        // Script info segment.
        let skip = 4
            + 4
            + 2
            + 2
            + 4 * missions.len()
            + if header.dialect == Dialect::SanAndreas { 4 } else { 0 };
        self.goto_over(skip);
        let id = self.seg_id();
        self.sink.emit_u8(id);
        self.sink.emit_u32(main_size);
        self.sink.emit_u32(largest_mission_size);
        self.sink.emit_u16(missions.len() as u16);
        self.sink.emit_u16(0); // number of exclusive missions
        if header.dialect == Dialect::SanAndreas {
            self.sink.emit_u32(0); // highest number of locals used in mission
        }
        for mission in &missions {
            let offset = mission.offset.get().expect("mission not placed in the image");
            self.sink.emit_i32(offset as i32);
        }

        // Streamed scripts directory.
        if header.dialect == Dialect::SanAndreas {
            let mut virtual_offset = multifile_size;

            self.goto_over(4 + 4 + 28 * (1 + streameds.len()));
            let id = self.seg_id();
            self.sink.emit_u8(id);
            self.sink.emit_u32(largest_streamed_size);
            self.sink.emit_u32(1 + streameds.len() as u32);

            for streamed in &streameds {
                let size = streamed.size.get().expect("script size not resolved");
                self.sink.emit_chars(20, &streamed.name());
                self.sink.emit_u32(virtual_offset);
                self.sink.emit_u32(size);
                virtual_offset += size;
            }

            // Sentinel entry the game expects at the end of the directory.
            self.sink.emit_chars(20, "AAA");
            self.sink.emit_u32(0);
            self.sink.emit_u32(8);
        }

        // Two trailing segments with undocumented contents; the constants
        // are what every known image carries and the VM accepts.
        if header.dialect == Dialect::SanAndreas {
            self.goto_over(4);
            let id = self.seg_id();
            self.sink.emit_u8(id);
            self.sink.emit_u32(0);

            self.goto_over(4 + 1 + 1 + 2);
            let id = self.seg_id();
            self.sink.emit_u8(id);
            self.sink.emit_u32(header.size_global_vars_space - 8);
            self.sink.emit_u8(0x3E); // TODO number of allocated externals
            self.sink.emit_u8(0x02);
            self.sink.emit_u16(0);
        }

        assert!(
            self.sink.is_full(),
            "header emission stopped at byte {} of {}",
            self.sink.cursor(),
            self.sink.capacity()
        );
        self.sink.into_bytes()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::ScriptData;
    use crate::sym::{SymArenas, SymTable};

    #[test]
    fn liberty_header_is_byte_exact() {
        let header = ScmHeader::new(Dialect::Liberty, 16, vec![], vec![]);
        assert_eq!(header.compiled_size(), 72);

        let mut expected: Vec<u8> = vec![];
        // Variables segment: trampoline to 16, NUL target id, 8 zero bytes.
        expected.extend([0x02, 0x00, 0x01, 16, 0, 0, 0]);
        expected.push(0);
        expected.extend([0u8; 8]);
        // Models segment: trampoline to 52, id, count 1, blank entry.
        expected.extend([0x02, 0x00, 0x01, 52, 0, 0, 0]);
        expected.push(0);
        expected.extend(1u32.to_le_bytes());
        expected.extend([0u8; 24]);
        // Script info segment: trampoline to 72, id, main size 72, no
        // missions.
        expected.extend([0x02, 0x00, 0x01, 72, 0, 0, 0]);
        expected.push(0);
        expected.extend(72u32.to_le_bytes());
        expected.extend(0u32.to_le_bytes());
        expected.extend(0u16.to_le_bytes());
        expected.extend(0u16.to_le_bytes());

        assert_eq!(header.generate(), expected);
    }

    #[test]
    fn miami_differs_from_liberty_only_in_the_target_id() {
        let liberty = ScmHeader::new(Dialect::Liberty, 16, vec![], vec![]).generate();
        let miami = ScmHeader::new(Dialect::Miami, 16, vec![], vec![]).generate();
        assert_eq!(liberty.len(), miami.len());
        assert_eq!(miami[7], b'm');
        assert_eq!(&liberty[8..], &miami[8..]);
    }

    #[test]
    fn minimal_san_andreas_header() {
        let header = ScmHeader::new(Dialect::SanAndreas, 8, vec![], vec![]);
        assert_eq!(header.compiled_size(), 140);

        let bytes = header.generate();
        assert_eq!(bytes.len(), 140);

        // Empty global space: the first trampoline jumps over just the id.
        assert_eq!(&bytes[..8], &[0x02, 0x00, 0x01, 8, 0, 0, 0, b's']);
        // Segment ids count up from the models segment onward.
        assert_eq!(bytes[15], 0);
        assert_eq!(bytes[51], 1);
        assert_eq!(bytes[75], 2);
        assert_eq!(bytes[119], 3);
        assert_eq!(bytes[131], 4);
        // Largest mission size is zero.
        assert_eq!(&bytes[56..60], &[0, 0, 0, 0]);
        // The streamed directory holds only the sentinel entry.
        assert_eq!(&bytes[80..84], 1u32.to_le_bytes());
        assert_eq!(&bytes[84..87], b"AAA");
        assert_eq!(&bytes[87..104], &[0u8; 17]);
        assert_eq!(&bytes[104..108], 0u32.to_le_bytes());
        assert_eq!(&bytes[108..112], 8u32.to_le_bytes());
        // Trailing segment carries its magic constants.
        assert_eq!(&bytes[132..140], &[0, 0, 0, 0, 0x3E, 0x02, 0, 0]);
    }

    #[test]
    fn aggregates_cover_missions_and_streamed_scripts() {
        let arenas = SymArenas::new();
        let symbols = SymTable::new(&arenas);

        let main = symbols.add_script(ScriptData::new("main.sc", ScriptType::Main));
        main.size.set(Some(10));
        main.offset.set(Some(172));
        let mission = symbols.add_script(ScriptData::new("intro.sc", ScriptType::Mission));
        mission.size.set(Some(20));
        mission.offset.set(Some(182));
        let streamed = symbols.add_script(ScriptData::new("scripts/zero.sc", ScriptType::StreamedScript));
        streamed.size.set(Some(30));
        streamed.offset.set(Some(0));

        let header = ScmHeader::new(
            Dialect::SanAndreas,
            8,
            vec![],
            vec![main, mission, streamed],
        );
        assert_eq!(header.compiled_size(), 172);

        let bytes = header.generate();
        assert_eq!(bytes.len(), 172);

        // Script info: main size includes the header and the main script
        // only; the mission is counted in the largest-mission slot and its
        // absolute offset is listed.
        assert_eq!(&bytes[52..56], 182u32.to_le_bytes());
        assert_eq!(&bytes[56..60], 20u32.to_le_bytes());
        assert_eq!(&bytes[60..62], 1u16.to_le_bytes());
        assert_eq!(&bytes[68..72], 182u32.to_le_bytes());

        // Streamed directory: the entry name is the upper-cased stem, its
        // virtual offset starts at the multifile size (header + main +
        // mission), and the sentinel follows.
        assert_eq!(&bytes[80..84], 30u32.to_le_bytes());
        assert_eq!(&bytes[84..88], 2u32.to_le_bytes());
        assert_eq!(&bytes[88..92], b"ZERO");
        assert_eq!(&bytes[92..108], &[0u8; 16]);
        assert_eq!(&bytes[108..112], 202u32.to_le_bytes());
        assert_eq!(&bytes[112..116], 30u32.to_le_bytes());
        assert_eq!(&bytes[116..119], b"AAA");
        assert_eq!(&bytes[136..140], 0u32.to_le_bytes());
        assert_eq!(&bytes[140..144], 8u32.to_le_bytes());
    }
}
