//! Entity wrappers and placeholder deferral.
//!
//! Entity wrapper nodes are externally owned and may carry live state, so
//! reconciliation must never tear them down as a side effect of reordering
//! unrelated siblings. Wrappers are recognized by a marker class; deferred
//! wrappers are stood in for by comment nodes until the caller splices them
//! back with [`swap_entity_placeholders`].

use crate::context::{EntityPair, RenderContext};
use crate::reuse::reuse_cached_element;
use content_model::Entity;
use dom_core::{DomError, HostTree, NodeKey, NodeKind};

pub(crate) const ENTITY_CLASS: &str = "_Entity";
pub(crate) const PLACEHOLDER_PREFIX: &str = "Entity:";

/// Marker class list identifying a wrapper and its entity.
pub(crate) fn entity_class_value(entity: &Entity) -> String {
    format!(
        "{ENTITY_CLASS} _EType_{} _EId_{} _EReadonly_{}",
        entity.entity_type, entity.id, entity.is_readonly as u8
    )
}

pub(crate) fn apply_entity_marker(
    tree: &mut HostTree,
    wrapper: NodeKey,
    entity: &Entity,
) -> Result<(), DomError> {
    tree.set_attr(wrapper, "class", &entity_class_value(entity))?;
    if entity.is_readonly {
        tree.set_attr(wrapper, "contenteditable", "false")?;
    } else {
        tree.remove_attr(wrapper, "contenteditable")?;
    }
    Ok(())
}

/// Whether a host node belongs to an entity: a marked wrapper element or a
/// placeholder comment.
pub(crate) fn is_entity_node(tree: &HostTree, key: NodeKey) -> Result<bool, DomError> {
    match tree.kind(key)? {
        NodeKind::Element => Ok(tree
            .get_attr(key, "class")?
            .is_some_and(|class| class.split_whitespace().any(|token| token == ENTITY_CLASS))),
        NodeKind::Comment => Ok(tree.text(key)?.starts_with(PLACEHOLDER_PREFIX)),
        _ => Ok(false),
    }
}

fn should_defer(
    tree: &HostTree,
    ctx: &RenderContext,
    wrapper: NodeKey,
    target_parent: NodeKey,
) -> Result<bool, DomError> {
    Ok(ctx.defer_entities
        && tree
            .parent(wrapper)?
            .is_some_and(|parent| parent != target_parent))
}

pub(crate) fn render_entity_block(
    tree: &mut HostTree,
    parent: NodeKey,
    entity: &mut Entity,
    ctx: &mut RenderContext,
    ref_node: Option<NodeKey>,
) -> Result<Option<NodeKey>, DomError> {
    let Some(wrapper) = entity.wrapper.filter(|&key| tree.contains(key)) else {
        log::trace!(target: "model_to_dom.entity", "entity {} has no wrapper, skipped", entity.id);
        return Ok(ref_node);
    };
    apply_entity_marker(tree, wrapper, entity)?;
    ctx.entity_map.insert(entity.id.clone(), wrapper);
    if should_defer(tree, ctx, wrapper, parent)? {
        let placeholder = tree.create_comment(&format!("{PLACEHOLDER_PREFIX}{}", entity.id));
        tree.insert_before(parent, placeholder, ref_node)?;
        ctx.entity_pairs.push(EntityPair {
            wrapper,
            placeholder,
        });
        return Ok(ref_node);
    }
    let next = reuse_cached_element(tree, parent, wrapper, ref_node)?;
    ctx.current.block = Some(wrapper);
    ctx.current.segment = None;
    Ok(next)
}

pub(crate) fn render_entity_segment(
    tree: &mut HostTree,
    container: NodeKey,
    entity: &mut Entity,
    ctx: &mut RenderContext,
    before: Option<NodeKey>,
) -> Result<(), DomError> {
    let Some(wrapper) = entity.wrapper.filter(|&key| tree.contains(key)) else {
        return Ok(());
    };
    apply_entity_marker(tree, wrapper, entity)?;
    ctx.entity_map.insert(entity.id.clone(), wrapper);
    if entity.is_selected {
        ctx.note_selection_start();
    }
    if should_defer(tree, ctx, wrapper, container)? {
        let placeholder = tree.create_comment(&format!("{PLACEHOLDER_PREFIX}{}", entity.id));
        tree.insert_before(container, placeholder, before)?;
        ctx.entity_pairs.push(EntityPair {
            wrapper,
            placeholder,
        });
        ctx.current.segment = Some(placeholder);
    } else {
        tree.insert_before(container, wrapper, before)?;
        ctx.current.segment = Some(wrapper);
    }
    if entity.is_selected {
        ctx.note_selection_end();
    }
    Ok(())
}

/// Replace each placeholder comment with its deferred wrapper, in order.
/// Placeholders whose parent disappeared are skipped.
pub fn swap_entity_placeholders(
    tree: &mut HostTree,
    pairs: &[EntityPair],
) -> Result<(), DomError> {
    for pair in pairs {
        let Some(parent) = tree.parent(pair.placeholder)? else {
            continue;
        };
        tree.insert_before(parent, pair.wrapper, Some(pair.placeholder))?;
        tree.remove_child(parent, pair.placeholder)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ConvertOptions, EditorContext};

    #[test]
    fn marker_classes_identify_wrappers() {
        let mut tree = HostTree::new();
        let wrapper = tree.create_element("div");
        let entity = Entity {
            is_readonly: true,
            ..Entity::new("e1", "widget")
        };
        apply_entity_marker(&mut tree, wrapper, &entity).unwrap();
        assert_eq!(
            tree.get_attr(wrapper, "class").unwrap(),
            Some("_Entity _EType_widget _EId_e1 _EReadonly_1")
        );
        assert_eq!(
            tree.get_attr(wrapper, "contenteditable").unwrap(),
            Some("false")
        );
        assert!(is_entity_node(&tree, wrapper).unwrap());
        let plain = tree.create_element("div");
        assert!(!is_entity_node(&tree, plain).unwrap());
    }

    #[test]
    fn placeholder_comments_are_entity_nodes() {
        let mut tree = HostTree::new();
        let placeholder = tree.create_comment("Entity:e1");
        let other = tree.create_comment("unrelated");
        assert!(is_entity_node(&tree, placeholder).unwrap());
        assert!(!is_entity_node(&tree, other).unwrap());
    }

    #[test]
    fn deferred_block_entity_leaves_wrapper_in_place() {
        let mut tree = HostTree::new();
        let old_home = tree.create_fragment();
        let wrapper = tree.create_element("div");
        tree.append_child(old_home, wrapper).unwrap();
        let target = tree.create_fragment();

        let mut entity = Entity::new("e1", "widget");
        entity.wrapper = Some(wrapper);
        let mut ctx = RenderContext::new(
            EditorContext::default(),
            ConvertOptions {
                defer_entities: true,
                ..ConvertOptions::default()
            },
        );
        render_entity_block(&mut tree, target, &mut entity, &mut ctx, None).unwrap();

        assert_eq!(tree.parent(wrapper).unwrap(), Some(old_home));
        assert_eq!(ctx.entity_pairs.len(), 1);
        let placeholder = ctx.entity_pairs[0].placeholder;
        assert_eq!(tree.parent(placeholder).unwrap(), Some(target));

        swap_entity_placeholders(&mut tree, &ctx.entity_pairs).unwrap();
        assert_eq!(tree.parent(wrapper).unwrap(), Some(target));
        assert_eq!(tree.parent(placeholder).unwrap(), None);
    }
}
