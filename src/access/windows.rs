//! Windows backend: wraps the process memory APIs behind the access trait.

use std::io;
use std::mem;
use std::ptr;

use winapi::shared::minwindef::{DWORD, FALSE, LPCVOID, LPVOID};
use winapi::shared::winerror::ERROR_NOT_ALL_ASSIGNED;
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::handleapi::CloseHandle;
use winapi::um::memoryapi::{ReadProcessMemory, VirtualQueryEx, WriteProcessMemory};
use winapi::um::processthreadsapi::{GetCurrentProcess, OpenProcess, OpenProcessToken};
use winapi::um::securitybaseapi::AdjustTokenPrivileges;
use winapi::um::winbase::LookupPrivilegeValueW;
use winapi::um::winnt::{
    HANDLE, MEMORY_BASIC_INFORMATION, MEM_COMMIT, PAGE_EXECUTE_READWRITE,
    PAGE_EXECUTE_WRITECOPY, PAGE_READWRITE, PAGE_WRITECOPY, PROCESS_ALL_ACCESS,
    SE_PRIVILEGE_ENABLED, TOKEN_ADJUST_PRIVILEGES, TOKEN_PRIVILEGES,
};

use crate::access::{ProcessMemoryAccess, RegionQuery};
use crate::core::types::{Address, ScanError, ScanResult};

const WRITABLE: DWORD =
    PAGE_READWRITE | PAGE_WRITECOPY | PAGE_EXECUTE_READWRITE | PAGE_EXECUTE_WRITECOPY;

/// RAII handle to a live target process.
///
/// One scan session binds to exactly one process; dropping the handle
/// closes it.
pub struct WindowsProcess {
    handle: HANDLE,
    pid: u32,
}

impl WindowsProcess {
    /// Opens a process for querying, reading and writing its memory
    pub fn open(pid: u32) -> ScanResult<Self> {
        let handle = unsafe { OpenProcess(PROCESS_ALL_ACCESS, FALSE, pid) };
        if handle.is_null() {
            return Err(ScanError::process_unavailable(
                pid,
                format!("OpenProcess failed: {}", io::Error::last_os_error()),
            ));
        }
        Ok(WindowsProcess { handle, pid })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for WindowsProcess {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { CloseHandle(self.handle) };
        }
    }
}

impl ProcessMemoryAccess for WindowsProcess {
    fn query_region(&self, probe: Address) -> ScanResult<Option<RegionQuery>> {
        let mut mbi: MEMORY_BASIC_INFORMATION = unsafe { mem::zeroed() };
        let written = unsafe {
            VirtualQueryEx(
                self.handle,
                probe.as_usize() as LPCVOID,
                &mut mbi,
                mem::size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };

        if written == 0 {
            // Past the highest region the process can own
            return Ok(None);
        }

        Ok(Some(RegionQuery {
            base: Address::new(mbi.BaseAddress as usize),
            size: mbi.RegionSize,
            committed: mbi.State & MEM_COMMIT != 0,
            writable: mbi.Protect & WRITABLE != 0,
        }))
    }

    fn read_bytes(&self, address: Address, buf: &mut [u8]) -> ScanResult<usize> {
        let mut bytes_read = 0usize;
        let ok = unsafe {
            ReadProcessMemory(
                self.handle,
                address.as_usize() as LPCVOID,
                buf.as_mut_ptr() as LPVOID,
                buf.len(),
                &mut bytes_read,
            )
        };

        // A failed call that still transferred bytes is a short read, not
        // a fault: the caller treats it as truncation.
        if ok == FALSE && bytes_read == 0 {
            return Err(ScanError::read_fault(
                address,
                format!("ReadProcessMemory failed: {}", io::Error::last_os_error()),
            ));
        }
        Ok(bytes_read)
    }

    fn write_bytes(&self, address: Address, data: &[u8]) -> ScanResult<()> {
        let mut bytes_written = 0usize;
        let ok = unsafe {
            WriteProcessMemory(
                self.handle,
                address.as_usize() as LPVOID,
                data.as_ptr() as LPCVOID,
                data.len(),
                &mut bytes_written,
            )
        };

        if ok == FALSE || bytes_written != data.len() {
            return Err(ScanError::write_fault(
                address,
                format!("WriteProcessMemory failed: {}", io::Error::last_os_error()),
            ));
        }
        Ok(())
    }
}

/// Enables SeDebugPrivilege on the current process token so that
/// `OpenProcess(PROCESS_ALL_ACCESS, ..)` reaches processes owned by other
/// users. Requires an elevated shell to succeed.
pub fn enable_debug_privilege() -> ScanResult<()> {
    let mut token: HANDLE = ptr::null_mut();
    let opened =
        unsafe { OpenProcessToken(GetCurrentProcess(), TOKEN_ADJUST_PRIVILEGES, &mut token) };
    if opened == FALSE {
        return Err(ScanError::Io(io::Error::last_os_error()));
    }

    let result = unsafe {
        let name: Vec<u16> = "SeDebugPrivilege".encode_utf16().chain(Some(0)).collect();
        let mut privileges: TOKEN_PRIVILEGES = mem::zeroed();
        privileges.PrivilegeCount = 1;
        privileges.Privileges[0].Attributes = SE_PRIVILEGE_ENABLED;

        if LookupPrivilegeValueW(
            ptr::null(),
            name.as_ptr(),
            &mut privileges.Privileges[0].Luid,
        ) == FALSE
        {
            Err(ScanError::Io(io::Error::last_os_error()))
        } else if AdjustTokenPrivileges(
            token,
            FALSE,
            &mut privileges,
            mem::size_of::<TOKEN_PRIVILEGES>() as DWORD,
            ptr::null_mut(),
            ptr::null_mut(),
        ) == FALSE
        {
            Err(ScanError::Io(io::Error::last_os_error()))
        } else if GetLastError() == ERROR_NOT_ALL_ASSIGNED {
            Err(ScanError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "token does not hold SeDebugPrivilege",
            )))
        } else {
            Ok(())
        }
    };

    unsafe { CloseHandle(token) };
    result
}
