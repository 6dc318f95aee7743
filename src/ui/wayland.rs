use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_keyboard, delegate_output, delegate_pointer, delegate_registry,
    delegate_seat, delegate_shm, delegate_layer,
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    seat::{
        keyboard::{KeyEvent, KeyboardHandler, Modifiers},
        pointer::{PointerEvent, PointerEventKind, PointerHandler},
        Capability, SeatHandler, SeatState,
    },
    shell::{
        wlr_layer::{
            Anchor, KeyboardInteractivity, Layer, LayerShell, LayerShellHandler, LayerSurface,
            LayerSurfaceConfigure,
        },
        WaylandSurface,
    },
    shm::{slot::SlotPool, Shm, ShmHandler},
};
use wayland_client::{
    globals::GlobalList,
    protocol::{wl_keyboard, wl_output, wl_pointer, wl_seat, wl_shm, wl_surface},
    Connection, QueueHandle,
};
use xkbcommon::xkb::{self, keysyms};
use tiny_skia::Pixmap;
use crate::config::Config;
use crate::launcher::{InputEvent, Launcher, LauncherCommand, Outcome};
use crate::ui::layout::{Hit, Layout};
use crate::ui::render::Renderer;
use crate::ui::surface::{FrameBuffer, PublishTarget};

const BTN_LEFT: u32 = 0x110;
const FALLBACK_WIDTH: u32 = 600;

pub struct WaylandApp {
    pub registry_state: RegistryState,
    pub seat_state: SeatState,
    pub output_state: OutputState,
    pub compositor_state: CompositorState,
    pub shm_state: Shm,
    pub layer_shell_state: LayerShell,

    pub layer_surface: Option<LayerSurface>,
    pub pool: Option<SlotPool>,
    pub width: u32,
    /// Set once the compositor configured the surface; cleared on unmap.
    pub configured: bool,
    pub should_exit: bool,
    /// Keep running while hidden instead of exiting.
    pub daemon: bool,
    shift: bool,

    pub config: Config,
    pub launcher: Launcher,
    pub renderer: Renderer,
    frame: FrameBuffer,
    layout: Layout,
}

/// A configured layer surface plus the shm pool frames are copied into.
struct ShmTarget<'a> {
    surface: &'a LayerSurface,
    pool: &'a mut SlotPool,
}

impl PublishTarget for ShmTarget<'_> {
    fn present(&mut self, frame: &Pixmap) -> bool {
        let width = frame.width();
        let height = frame.height();
        let len = (width * height * 4) as usize;
        if self.pool.len() < len {
            if let Err(e) = self.pool.resize(len) {
                log::error!("Failed to grow shm pool: {}", e);
                return false;
            }
        }

        let (buffer, canvas) = match self.pool.create_buffer(
            width as i32,
            height as i32,
            (width * 4) as i32,
            wl_shm::Format::Argb8888,
        ) {
            Ok(b) => b,
            Err(e) => {
                log::error!("Failed to create shm buffer: {}", e);
                return false;
            }
        };

        // tiny-skia is RGBA, Argb8888 is BGRA in memory
        for (dst, src) in canvas.chunks_exact_mut(4).zip(frame.data().chunks_exact(4)) {
            dst.copy_from_slice(&[src[2], src[1], src[0], src[3]]);
        }

        let surface = self.surface.wl_surface();
        surface.attach(Some(buffer.wl_buffer()), 0, 0);
        surface.damage(0, 0, width as i32, height as i32);
        surface.commit();
        true
    }
}

impl WaylandApp {
    pub fn new(globals: &GlobalList, qh: &QueueHandle<Self>, config: Config, launcher: Launcher, renderer: Renderer, daemon: bool) -> Self {
        let registry_state = RegistryState::new(globals);
        let seat_state = SeatState::new(globals, qh);
        let output_state = OutputState::new(globals, qh);
        let compositor_state = CompositorState::bind(globals, qh).expect("wl_compositor not available");
        let shm_state = Shm::bind(globals, qh).expect("wl_shm not available");
        let layer_shell_state = LayerShell::bind(globals, qh).expect("zwlr_layer_shell_v1 not available");

        let width = config.theme.width.unwrap_or(FALLBACK_WIDTH);
        let layout = Layout::new(&config.theme, width, launcher.tabs().len());
        let frame = FrameBuffer::new(width, layout.height()).expect("frame buffer size");

        Self {
            registry_state,
            seat_state,
            output_state,
            compositor_state,
            shm_state,
            layer_shell_state,
            layer_surface: None,
            pool: None,
            width,
            configured: false,
            should_exit: false,
            daemon,
            shift: false,
            config,
            launcher,
            renderer,
            frame,
            layout,
        }
    }

    /// Creates the single layer surface used for the whole session. It
    /// stays unmapped until the launcher is shown.
    pub fn create_surface(&mut self, qh: &QueueHandle<Self>) {
        let surface = self.compositor_state.create_surface(qh);
        let layer_surface = self.layer_shell_state.create_layer_surface(
            qh,
            surface,
            Layer::Overlay,
            Some("menubar"),
            None,
        );

        let anchor = if self.config.theme.width.is_some() {
            Anchor::TOP
        } else {
            Anchor::TOP | Anchor::LEFT | Anchor::RIGHT
        };
        layer_surface.set_anchor(anchor);
        layer_surface.set_size(self.config.theme.width.unwrap_or(0), self.layout.height());
        layer_surface.set_keyboard_interactivity(KeyboardInteractivity::None);
        layer_surface.commit();
        self.layer_surface = Some(layer_surface);
    }

    pub fn handle_command(&mut self, command: LauncherCommand) {
        let outcome = self.launcher.handle_command(command);
        self.apply(outcome);
    }

    fn handle_input(&mut self, event: InputEvent) {
        let outcome = self.launcher.handle_input(event);
        self.apply(outcome);
    }

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Unchanged => {}
            Outcome::Redraw => self.render(),
            Outcome::Shown => {
                self.map();
                self.render();
            }
            Outcome::Hidden => self.unmap(),
        }
    }

    fn map(&mut self) {
        let Some(layer_surface) = &self.layer_surface else { return };
        layer_surface.set_keyboard_interactivity(KeyboardInteractivity::Exclusive);
        layer_surface.set_size(self.config.theme.width.unwrap_or(0), self.layout.height());
        layer_surface.commit();
    }

    fn unmap(&mut self) {
        if let Some(layer_surface) = &self.layer_surface {
            layer_surface.set_keyboard_interactivity(KeyboardInteractivity::None);
            layer_surface.wl_surface().attach(None, 0, 0);
            layer_surface.wl_surface().commit();
        }
        self.configured = false;
        if !self.daemon {
            self.should_exit = true;
        }
    }

    /// Draws into the owned frame and publishes it if the surface can take it.
    pub fn render(&mut self) {
        let layout = Layout::new(&self.config.theme, self.width, self.launcher.tabs().len());
        if layout.height() != self.layout.height() {
            if let Some(layer_surface) = &self.layer_surface {
                layer_surface.set_size(self.config.theme.width.unwrap_or(0), layout.height());
            }
        }
        self.layout = layout;
        self.frame.resize(self.width, self.layout.height());

        let drawn = self.renderer.draw(&mut self.frame.canvas(), &self.launcher, &self.config.theme, &self.layout);
        if drawn {
            self.frame.mark_drawn();
            self.publish();
        }
    }

    fn publish(&mut self) {
        let target = match (&self.layer_surface, self.pool.as_mut()) {
            (Some(surface), Some(pool)) if self.configured => Some(ShmTarget { surface, pool }),
            _ => None,
        };
        match target {
            Some(mut t) => self.frame.publish(Some(&mut t)),
            None => self.frame.publish(None),
        };
    }

    fn pointer_hit(&self, position: (f64, f64)) -> Hit {
        self.layout.hit(position.0, position.1)
    }
}

impl LayerShellHandler for WaylandApp {
    fn closed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface) {
        self.should_exit = true;
    }

    fn configure(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _layer: &LayerSurface,
        configure: LayerSurfaceConfigure,
        _serial: u32,
    ) {
        if configure.new_size.0 > 0 {
            self.width = configure.new_size.0;
        }
        self.configured = true;

        let len = (self.width * self.layout.height() * 4) as usize;
        if let Some(pool) = self.pool.as_mut() {
            if pool.len() < len {
                if let Err(e) = pool.resize(len) {
                    log::error!("Failed to grow shm pool: {}", e);
                }
            }
        } else {
            match SlotPool::new(len, &self.shm_state) {
                Ok(pool) => self.pool = Some(pool),
                Err(e) => log::error!("Failed to create shm pool: {}", e),
            }
        }

        self.render();
    }
}

impl CompositorHandler for WaylandApp {
    fn scale_factor_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_factor: i32,
    ) {}

    fn frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _time: u32,
    ) {
        if self.launcher.is_visible() {
            self.publish();
        }
    }

    fn transform_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_transform: wl_output::Transform,
    ) {}

    fn surface_enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {}

    fn surface_leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {}
}

impl OutputHandler for WaylandApp {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }
    fn new_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
    fn update_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
    fn output_destroyed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
}

impl SeatHandler for WaylandApp {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat) {}

    fn new_capability(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        seat: wl_seat::WlSeat,
        capability: Capability,
    ) {
        match capability {
            Capability::Keyboard => {
                if let Err(e) = self.seat_state.get_keyboard(qh, &seat, None) {
                    log::warn!("Failed to get keyboard: {}", e);
                }
            }
            Capability::Pointer => {
                if let Err(e) = self.seat_state.get_pointer(qh, &seat) {
                    log::warn!("Failed to get pointer: {}", e);
                }
            }
            _ => {}
        }
    }

    fn remove_capability(
        &mut self,
        _conn: &Connection,
        _: &QueueHandle<Self>,
        _: wl_seat::WlSeat,
        _capability: Capability,
    ) {}

    fn remove_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat) {}
}

/// Maps a key press to launcher input. `shift` selects the backwards tab.
fn key_to_input(event: &KeyEvent, shift: bool) -> Option<InputEvent> {
    match u32::from(event.keysym) {
        keysyms::KEY_Escape => Some(InputEvent::Escape),
        keysyms::KEY_Return | keysyms::KEY_KP_Enter => Some(InputEvent::Enter),
        keysyms::KEY_Up => Some(InputEvent::Up),
        keysyms::KEY_Down => Some(InputEvent::Down),
        keysyms::KEY_BackSpace => Some(InputEvent::Backspace),
        keysyms::KEY_ISO_Left_Tab => Some(InputEvent::PrevTab),
        keysyms::KEY_Tab if shift => Some(InputEvent::PrevTab),
        keysyms::KEY_Tab => Some(InputEvent::NextTab),
        _ => event
            .utf8
            .as_ref()
            .filter(|text| !text.chars().any(|c| c.is_control()))
            .map(|text| InputEvent::Text(text.clone())),
    }
}

impl KeyboardHandler for WaylandApp {
    fn enter(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: &wl_surface::WlSurface,
        _: u32,
        _: &[u32],
        _: &[xkb::Keysym],
    ) {}

    fn leave(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: &wl_surface::WlSurface,
        _: u32,
    ) {
        self.handle_command(LauncherCommand::Hide);
    }

    fn press_key(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        event: KeyEvent,
    ) {
        if let Some(input) = key_to_input(&event, self.shift) {
            self.handle_input(input);
        }
    }

    fn release_key(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: u32,
        _: KeyEvent,
    ) {}

    fn update_modifiers(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _serial: u32,
        modifiers: Modifiers,
        _layout: u32,
    ) {
        self.shift = modifiers.shift;
    }
}

impl PointerHandler for WaylandApp {
    fn pointer_frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _pointer: &wl_pointer::WlPointer,
        events: &[PointerEvent],
    ) {
        for event in events {
            let ours = self
                .layer_surface
                .as_ref()
                .is_some_and(|ls| ls.wl_surface() == &event.surface);
            if !ours {
                continue;
            }

            let scroll_offset = self.launcher.state().scroll_offset();
            let input = match (&event.kind, self.pointer_hit(event.position)) {
                (PointerEventKind::Enter { .. } | PointerEventKind::Motion { .. }, Hit::Row(row)) => {
                    Some(InputEvent::Hover(scroll_offset + row))
                }
                (PointerEventKind::Press { button: BTN_LEFT, .. }, Hit::Row(row)) => {
                    Some(InputEvent::Click(scroll_offset + row))
                }
                (PointerEventKind::Press { button: BTN_LEFT, .. }, Hit::Tab(index)) => {
                    Some(InputEvent::ClickTab(index))
                }
                _ => None,
            };
            if let Some(input) = input {
                self.handle_input(input);
            }
        }
    }
}

impl ShmHandler for WaylandApp {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm_state
    }
}

delegate_compositor!(WaylandApp);
delegate_output!(WaylandApp);
delegate_shm!(WaylandApp);
delegate_seat!(WaylandApp);
delegate_keyboard!(WaylandApp);
delegate_pointer!(WaylandApp);
delegate_layer!(WaylandApp);
delegate_registry!(WaylandApp);

impl ProvidesRegistryState for WaylandApp {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    fn runtime_add_global(&mut self, _: &Connection, _: &QueueHandle<Self>, _: u32, _: &str, _: u32) {
    }
    fn runtime_remove_global(&mut self, _: &Connection, _: &QueueHandle<Self>, _: u32, _: &str) {
    }
}
