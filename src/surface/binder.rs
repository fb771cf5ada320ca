//! Interaction binder: keeps the single click binding in sync with the
//! `interactive` flag and the callback reference.

use crate::surface::handle::{ClickBinding, MapHandle};
use crate::surface::props::{same_callback, LocationCallback};
use uuid::Uuid;

/// What a binding sync did, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingChange {
    Unchanged,
    Bound,
    Rebound,
    Unbound,
}

/// Bring the binding slot in line with the desired state. At most one binding
/// exists at any time; a changed callback reference replaces the previous
/// binding rather than accumulating. Operates on the existing handle — never
/// requires the map to be recreated.
pub fn sync(
    handle: &mut MapHandle,
    interactive: bool,
    callback: Option<&LocationCallback>,
) -> BindingChange {
    let desired = if interactive { callback } else { None };

    let change = match (handle.binding.as_ref(), desired) {
        (None, None) => BindingChange::Unchanged,
        (Some(current), Some(cb)) if same_callback(Some(&current.callback), Some(cb)) => {
            BindingChange::Unchanged
        }
        (Some(_), Some(_)) => BindingChange::Rebound,
        (None, Some(_)) => BindingChange::Bound,
        (Some(_), None) => BindingChange::Unbound,
    };

    match change {
        BindingChange::Unchanged => {}
        BindingChange::Unbound => {
            let old = handle.binding.take();
            if let Some(old) = old {
                log::debug!("click binding {} removed", old.id);
            }
        }
        BindingChange::Bound | BindingChange::Rebound => {
            // Unbind first, then attach the fresh binding.
            handle.binding = None;
            let binding = ClickBinding {
                id: Uuid::new_v4(),
                callback: desired.expect("desired callback present").clone(),
            };
            log::debug!("click binding {} attached", binding.id);
            handle.binding = Some(binding);
        }
    }

    change
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::render::backends::null::NullBackend;
    use crate::viewport::Viewport;
    use std::sync::Arc;

    fn handle() -> MapHandle {
        let config = MapConfig::default();
        MapHandle::new(
            Box::new(NullBackend::new()),
            Viewport::new(config.fallback_center, config.initial_zoom, None),
        )
    }

    #[test]
    fn binds_only_when_interactive_with_callback() {
        let mut handle = handle();
        let cb: LocationCallback = Arc::new(|_| {});

        assert_eq!(sync(&mut handle, false, Some(&cb)), BindingChange::Unchanged);
        assert!(handle.binding.is_none());

        assert_eq!(sync(&mut handle, true, None), BindingChange::Unchanged);
        assert!(handle.binding.is_none());

        assert_eq!(sync(&mut handle, true, Some(&cb)), BindingChange::Bound);
        assert!(handle.binding.is_some());
    }

    #[test]
    fn changed_callback_replaces_the_binding() {
        let mut handle = handle();
        let first: LocationCallback = Arc::new(|_| {});
        let second: LocationCallback = Arc::new(|_| {});

        sync(&mut handle, true, Some(&first));
        let first_id = handle.binding.as_ref().unwrap().id;

        // Same Arc again: nothing to do.
        assert_eq!(sync(&mut handle, true, Some(&first)), BindingChange::Unchanged);
        assert_eq!(handle.binding.as_ref().unwrap().id, first_id);

        assert_eq!(sync(&mut handle, true, Some(&second)), BindingChange::Rebound);
        assert_ne!(handle.binding.as_ref().unwrap().id, first_id);
    }

    #[test]
    fn turning_interactive_off_unbinds() {
        let mut handle = handle();
        let cb: LocationCallback = Arc::new(|_| {});

        sync(&mut handle, true, Some(&cb));
        assert_eq!(sync(&mut handle, false, Some(&cb)), BindingChange::Unbound);
        assert!(handle.binding.is_none());
    }
}
