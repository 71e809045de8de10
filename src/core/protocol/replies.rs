// src/core/protocol/replies.rs

//! Builders for every text the server writes to a client. All of them end in `\n`
//! except the name prompt.

/// Sent once, right after a connection is accepted.
pub const NAME_PROMPT: &str = "Ingrese su nombre: ";

/// The reply to any `@h` command.
pub const HELP_TEXT: &str = "Comandos disponibles:\n\
@usuarios - Lista de usuarios conectados\n\
@conexion - Muestra la conexión y el número de usuarios\n\
@salir - Desconectar del chat\n";

pub const ROSTER_HEADER: &str = "Usuarios conectados:\n";

pub fn join_notice(name: &str) -> String {
    format!("{name} se ha conectado al chat.\n")
}

pub fn leave_notice(name: &str) -> String {
    format!("{name} se ha desconectado del chat.\n")
}

/// Formats a relayed chat line as `<name>: <text>`.
pub fn chat_line(name: &str, text: &str) -> String {
    format!("{name}: {text}\n")
}

/// The header followed by one name per line, in the order given.
pub fn roster<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::from(ROSTER_HEADER);
    for name in names {
        out.push_str(name);
        out.push('\n');
    }
    out
}

pub fn connection_count(count: usize) -> String {
    format!("Número de usuarios conectados: {count}\n")
}
