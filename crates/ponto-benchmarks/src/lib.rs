#![warn(missing_docs)]
//! # ponto-benchmarks
//!
//! Representative payloads for the decode-path smoke benchmarks in `tests/`.

/// Nested device-info body with every capability flag and a date call.
pub const DEVICE_INFO_BODY: &str = "{success:true,deviceInfo:{useCracha:false,useUserPwd:true,\
oplLiberarFolhaRVirtual:'N',oplLiberarCCustoRVirtual:'N',oplLiberarFuncoesRVirtual:'S',\
dtTimeEvent:new Date(2024,0,15,8,0,5)}}";

/// Accepted mark-point envelope.
pub const MARK_POINT_BODY: &str = "{success:true,msg:{msg:'Ponto registrado com sucesso!',type:1}}";
