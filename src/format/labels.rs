//! Static reply strings.

pub(super) fn lookup(key: &str) -> Option<&'static str> {
    let text = match key {
        "apology" => "Lo siento, algo salió mal procesando tu mensaje. Por favor intenta de nuevo en un momento.",
        "didnt_understand" => "No entendí bien tu mensaje. ¿Puedes decirlo de otra forma? Por ejemplo: \"Gasté 20000 en transporte\".",
        "cancelled" => "❌ Operación cancelada. No se registró nada.",
        "nothing_to_confirm" => "No tienes ninguna operación pendiente por confirmar.",
        "nothing_to_cancel" => "No tienes ninguna operación pendiente por cancelar.",
        "confirmation_expired" => "⌛ La confirmación expiró y la operación no se registró. Si aún quieres hacerla, envíala de nuevo.",
        "confirm_instructions" => "¿Confirmas? Responde *sí* para continuar o *no* para cancelar.",
        "expiry_notice" => "Tienes 60 segundos para responder.",
        "create_failed" => "No pude registrar el movimiento en este momento. Intenta de nuevo más tarde.",
        "delete_failed" => "No pude eliminar el movimiento en este momento. Intenta de nuevo más tarde.",
        "rule_failed" => "No pude guardar la regla en este momento. Intenta de nuevo más tarde.",
        "query_failed" => "No pude consultar tu información en este momento. Intenta de nuevo más tarde.",
        "missing_amount" => "Necesito el monto para registrarlo. Por ejemplo: \"Gasté 15000 en café\".",
        "missing_delete_target" => "¿Cuál movimiento quieres eliminar? Dime su descripción o su número de referencia.",
        "missing_search_query" => "¿Qué quieres buscar? Por ejemplo: \"busca uber\".",
        "no_transactions" => "No encontré movimientos.",
        "no_rules" => "No tienes reglas configuradas.",
        "conversation_cleared" => "Listo, olvidé nuestra conversación reciente.",
        "no_pending" => "No tienes operaciones pendientes.",
        "help" => "Soy tu asistente de finanzas. Puedes escribirme cosas como:\n\
                   • \"Gasté 50000 en comida\"\n\
                   • \"Recibí 2 millones de sueldo\"\n\
                   • \"¿Cuál es mi saldo?\"\n\
                   • \"Resumen del mes\"\n\
                   • \"¿Me alcanza para un celular de 1 millón?\"\n\n\
                   Los movimientos mayores a $3,000,000 te pediré confirmarlos.\n\n\
                   Comandos: /pendiente, /confirmar, /cancelar, /olvidar, /ayuda",
        _ => return None,
    };
    Some(text)
}
