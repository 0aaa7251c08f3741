//! Symbol storage shared across the code generation units
//!
//! Scripts, labels and variables are allocated once and then referred to from
//! many places: IR nodes borrow them, the header needs the script list, and
//! label references may cross script boundaries. They are therefore owned by
//! arenas and handed out as pointer-identity handles. The table is
//! append-only, so registration works through a shared reference; nothing is
//! ever removed or moved.

use crate::ir::{LabelData, LabelId, ScriptData, ScriptId, VarData, VarId};
use crate::util::RefId;
use elsa::FrozenVec;
use typed_arena::Arena;

/// Backing storage for a [`SymTable`].
///
/// Kept separate from the table itself so that the arenas outlive the
/// references handed out while the table is in use.
pub struct SymArenas<'a> {
    scripts: Arena<ScriptData>,
    labels: Arena<LabelData<'a>>,
    vars: Arena<VarData>,
}

impl<'a> SymArenas<'a> {
    pub fn new() -> SymArenas<'a> {
        SymArenas {
            scripts: Arena::new(),
            labels: Arena::new(),
            vars: Arena::new(),
        }
    }
}

impl<'a> Default for SymArenas<'a> {
    fn default() -> Self {
        SymArenas::new()
    }
}

/// Owner of every script, label and variable of a program.
pub struct SymTable<'a> {
    arenas: &'a SymArenas<'a>,

    /// Registration order of scripts; this is also the image layout order.
    scripts: FrozenVec<&'a ScriptData>,
}

impl<'a> SymTable<'a> {
    pub fn new(arenas: &'a SymArenas<'a>) -> SymTable<'a> {
        SymTable {
            arenas,
            scripts: FrozenVec::new(),
        }
    }

    pub fn add_script(&self, data: ScriptData) -> ScriptId<'a> {
        let data: &'a ScriptData = self.arenas.scripts.alloc(data);
        self.scripts.push(data);
        RefId(data)
    }

    /// Allocate a fresh, unresolved label owned by `script`.
    pub fn add_label(&self, script: ScriptId<'a>) -> LabelId<'a> {
        RefId(self.arenas.labels.alloc(LabelData::new(script)))
    }

    pub fn add_var(&self, data: VarData) -> VarId<'a> {
        RefId(self.arenas.vars.alloc(data))
    }

    /// Scripts in registration order.
    pub fn scripts(&'a self) -> impl Iterator<Item = ScriptId<'a>> + 'a {
        (0..self.scripts.len()).map(move |idx| RefId(self.scripts.get(idx).expect("index in range")))
    }

    pub fn script_count(&self) -> usize {
        self.scripts.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::ScriptType;

    #[test]
    fn scripts_come_back_in_registration_order() {
        let arenas = SymArenas::new();
        let symbols = SymTable::new(&arenas);

        let main = symbols.add_script(ScriptData::new("main.sc", ScriptType::Main));
        let mission = symbols.add_script(ScriptData::new("intro.sc", ScriptType::Mission));

        let registered: Vec<_> = symbols.scripts().collect();
        assert_eq!(registered, vec![main, mission]);
        assert_eq!(symbols.script_count(), 2);
    }

    #[test]
    fn labels_link_back_to_their_script() {
        let arenas = SymArenas::new();
        let symbols = SymTable::new(&arenas);

        let script = symbols.add_script(ScriptData::new("main.sc", ScriptType::Main));
        let label = symbols.add_label(script);
        assert_eq!(label.script, script);
        assert_eq!(label.local_offset.get(), None);
    }
}
