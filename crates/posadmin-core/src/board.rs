//! Message board tag layout.
//!
//! Tags are shown in two lists, visible and hidden, each ordered by the
//! per-user `order` the backend stores in `/api/tags/visibility/`.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::models::{Mensaje, Tag, TagOrder, TagVisibility};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Message already has tag '{0}'")]
    DuplicateTag(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagBoard {
    pub visible: Vec<Tag>,
    pub hidden: Vec<Tag>,
}

impl TagBoard {
    /// Split tags into visible and hidden lists, ordered by their stored
    /// `order`. Tags without visibility settings are visible with order 0;
    /// ties keep the order the tags were listed in.
    pub fn arrange(tags: Vec<Tag>, visibility: &[TagVisibility]) -> Self {
        let settings: HashMap<i64, &TagVisibility> =
            visibility.iter().map(|v| (v.tag_id, v)).collect();

        let mut tags = tags;
        tags.sort_by_key(|t| settings.get(&t.id).map_or(0, |v| v.order));

        let (hidden, visible): (Vec<Tag>, Vec<Tag>) = tags
            .into_iter()
            .partition(|t| settings.get(&t.id).is_some_and(|v| v.is_hidden));

        Self { visible, hidden }
    }

    /// Fetch tags and their visibility settings and arrange them
    pub async fn load(api: &ApiClient) -> Result<Self, ApiError> {
        let (tags, visibility) = futures::try_join!(api.fetch_tags(), api.fetch_tag_visibility())?;
        Ok(Self::arrange(tags, &visibility))
    }

    pub fn is_hidden(&self, tag_id: i64) -> Option<bool> {
        if self.visible.iter().any(|t| t.id == tag_id) {
            Some(false)
        } else if self.hidden.iter().any(|t| t.id == tag_id) {
            Some(true)
        } else {
            None
        }
    }

    /// Move a tag to the other list, appending it at the end.
    /// Returns the new hidden state, or `None` for an unknown tag.
    pub fn toggle(&mut self, tag_id: i64) -> Option<bool> {
        if let Some(pos) = self.visible.iter().position(|t| t.id == tag_id) {
            let tag = self.visible.remove(pos);
            self.hidden.push(tag);
            Some(true)
        } else if let Some(pos) = self.hidden.iter().position(|t| t.id == tag_id) {
            let tag = self.hidden.remove(pos);
            self.visible.push(tag);
            Some(false)
        } else {
            None
        }
    }

    /// Persist a visibility toggle, then apply it locally
    pub async fn toggle_remote(&mut self, api: &ApiClient, tag_id: i64) -> Result<Option<bool>, ApiError> {
        let Some(hidden) = self.is_hidden(tag_id) else {
            return Ok(None);
        };
        api.set_tag_hidden(tag_id, !hidden).await?;
        Ok(self.toggle(tag_id))
    }

    /// Move the visible tag at `from` to `to` (clamped to the list) and
    /// return the order assignments for every visible tag.
    pub fn reorder(&mut self, from: usize, to: usize) -> Option<Vec<TagOrder>> {
        if from >= self.visible.len() {
            return None;
        }
        let tag = self.visible.remove(from);
        let to = to.min(self.visible.len());
        self.visible.insert(to, tag);
        Some(self.visible_order())
    }

    /// Send the new order to the backend; the local order only changes
    /// once the backend has accepted it.
    pub async fn reorder_remote(&mut self, api: &ApiClient, from: usize, to: usize) -> Result<bool, ApiError> {
        let mut next = self.clone();
        let Some(order) = next.reorder(from, to) else {
            return Ok(false);
        };
        api.reorder_tags(&order).await?;
        debug!(from, to, "Tag order saved");
        *self = next;
        Ok(true)
    }

    pub fn visible_order(&self) -> Vec<TagOrder> {
        self.visible
            .iter()
            .enumerate()
            .map(|(i, t)| TagOrder {
                tag_id: t.id,
                order: i as i64,
            })
            .collect()
    }
}

/// Tag list for `mensaje` with `tag` added
pub fn add_tag_to_message(mensaje: &Mensaje, tag: &str) -> Result<Vec<String>, BoardError> {
    let tag = tag.trim();
    if mensaje.has_tag(tag) {
        return Err(BoardError::DuplicateTag(tag.to_string()));
    }
    let mut tags = mensaje.tag_names();
    tags.push(tag.to_string());
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(id: i64, nombre: &str) -> Tag {
        Tag {
            id,
            nombre: nombre.to_string(),
            respuestas_count: 0,
        }
    }

    fn vis(tag_id: i64, is_hidden: bool, order: i64) -> TagVisibility {
        TagVisibility { tag_id, is_hidden, order }
    }

    fn ids(tags: &[Tag]) -> Vec<i64> {
        tags.iter().map(|t| t.id).collect()
    }

    fn sample() -> TagBoard {
        TagBoard::arrange(
            vec![tag(1, "saludo"), tag(2, "precios"), tag(3, "horario"), tag(4, "envios")],
            &[vis(1, false, 2), vis(2, true, 0), vis(3, false, 1)],
        )
    }

    #[test]
    fn test_arrange_sorts_and_splits() {
        let board = sample();
        // tag 4 has no settings, so it is visible with order 0 and sorts after tag 2
        assert_eq!(ids(&board.visible), vec![4, 3, 1]);
        assert_eq!(ids(&board.hidden), vec![2]);
    }

    #[test]
    fn test_arrange_is_stable_for_equal_order() {
        let board = TagBoard::arrange(vec![tag(9, "b"), tag(5, "a"), tag(7, "c")], &[]);
        assert_eq!(ids(&board.visible), vec![9, 5, 7]);
        assert!(board.hidden.is_empty());
    }

    #[test]
    fn test_toggle_appends_to_other_list() {
        let mut board = sample();
        assert_eq!(board.toggle(3), Some(true));
        assert_eq!(ids(&board.visible), vec![4, 1]);
        assert_eq!(ids(&board.hidden), vec![2, 3]);

        assert_eq!(board.toggle(2), Some(false));
        assert_eq!(ids(&board.visible), vec![4, 1, 2]);
        assert_eq!(board.toggle(42), None);
    }

    #[test]
    fn test_reorder() {
        let mut board = sample();
        let order = board.reorder(0, 2).unwrap();
        assert_eq!(ids(&board.visible), vec![3, 1, 4]);
        assert_eq!(
            order,
            vec![
                TagOrder { tag_id: 3, order: 0 },
                TagOrder { tag_id: 1, order: 1 },
                TagOrder { tag_id: 4, order: 2 },
            ]
        );
    }

    #[test]
    fn test_reorder_clamps_target() {
        let mut board = sample();
        board.reorder(0, 99).unwrap();
        assert_eq!(ids(&board.visible), vec![3, 1, 4]);
    }

    #[test]
    fn test_reorder_out_of_range_is_noop() {
        let mut board = sample();
        assert!(board.reorder(3, 0).is_none());
        assert_eq!(board, sample());
    }

    #[test]
    fn test_add_tag_to_message() {
        let mensaje = Mensaje {
            id: 1,
            contenido: "Hola".to_string(),
            tags: vec![tag(1, "saludo")],
        };
        assert_eq!(
            add_tag_to_message(&mensaje, " horario ").unwrap(),
            vec!["saludo".to_string(), "horario".to_string()]
        );
        assert_eq!(
            add_tag_to_message(&mensaje, "saludo"),
            Err(BoardError::DuplicateTag("saludo".to_string()))
        );
    }
}
