//! Virtual modifier declarations (`virtual_modifiers NumLock, AltGr = Mod5;`).

use super::ast::{MergeMode, VModDef};
use super::context::Context;
use super::expr::resolve_mod_mask;
use super::keymap::{Keymap, VirtualModifier, MAX_VMODS};

pub fn handle_vmod_def(
    ctx: &mut Context,
    keymap: &mut Keymap,
    def: &VModDef,
    merge: MergeMode,
) -> bool {
    let merge = if def.merge == MergeMode::Default {
        merge
    } else {
        def.merge
    };

    let mapping = match &def.value {
        None => None,
        Some(value) => match resolve_mod_mask(ctx, keymap, value) {
            Some(mask) if mask & !0xff == 0 => Some(mask),
            _ => {
                ctx.error(format!(
                    "Declaration of {} ignored; Value must be a mask of real modifiers",
                    def.name
                ));
                return false;
            }
        },
    };

    let name = ctx.intern(&def.name);
    if let Some(index) = keymap.find_vmod(name) {
        if let Some(mapping) = mapping {
            let existing = &mut keymap.vmods[index];
            if existing.mapping != mapping {
                let (use_mapping, ignore) = if merge == MergeMode::Augment {
                    (existing.mapping, mapping)
                } else {
                    (mapping, existing.mapping)
                };
                existing.mapping = use_mapping;
                ctx.warn(format!(
                    "Virtual modifier {} defined multiple times; \
                     Using 0x{:x}, ignoring 0x{:x}",
                    def.name, use_mapping, ignore
                ));
            }
        }
        return true;
    }

    if keymap.vmods.len() >= MAX_VMODS {
        ctx.error(format!(
            "Too many virtual modifiers defined (maximum {}); Ignoring {}",
            MAX_VMODS, def.name
        ));
        return false;
    }

    keymap.vmods.push(VirtualModifier {
        name,
        mapping: mapping.unwrap_or(0),
    });
    true
}
