#![deny(missing_docs)]

use crate::linux;
use libc;
use std::{
    ffi::{CStr, CString},
    io,
    mem::{self, MaybeUninit},
    net::Ipv4Addr,
    os::unix::io::{AsRawFd, RawFd},
};

/// The link-level address a frame was received from, as filled in by `recvfrom`.
pub struct Addr {
    inner: libc::sockaddr_storage,
    _len: libc::socklen_t,
}

impl Addr {
    fn link_layer(&self) -> &libc::sockaddr_ll {
        // sockaddr_storage is large enough and suitably aligned for every socket address type,
        // and an AF_PACKET socket always reports a sockaddr_ll.
        unsafe { &*(&self.inner as *const libc::sockaddr_storage as *const libc::sockaddr_ll) }
    }

    /// The `sll_pkttype` of the frame: host, broadcast, multicast, otherhost or outgoing.
    pub fn packet_type(&self) -> u8 {
        self.link_layer().sll_pkttype
    }

    /// True if the frame was sent by this host and merely looped back to the socket.
    pub fn is_outgoing(&self) -> bool {
        self.packet_type() == linux::PACKET_OUTGOING
    }

    /// True if the frame was addressed to some other host's MAC and only reached us because
    /// the interface is promiscuous.
    pub fn is_other_host(&self) -> bool {
        self.packet_type() == linux::PACKET_OTHERHOST
    }
}

/// Represents an unbound `AF_PACKET` socket.  At this phase of a socket's lifecycle, it can be
/// configured.
pub struct Socket {
    fd: libc::c_int,
}

/// Represents a bound `AF_PACKET` socket. At this phase of a socket's lifecycle, it can be read
/// to/written from.
pub struct BoundSocket {
    fd: libc::c_int,
    send_addr: libc::sockaddr_ll,
    iface: CString,
}

// Builds an ifreq naming `iface`. Names must leave room for the terminating NUL.
fn ifreq_for(iface: &CStr) -> io::Result<linux::ifreq> {
    let name = iface.to_bytes();
    if name.is_empty() || name.len() >= libc::IFNAMSIZ {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "interface name must be 1 to 15 bytes long",
        ));
    }
    // An all zero ifreq is valid: every member is plain old data.
    let mut ifr: linux::ifreq = unsafe { MaybeUninit::zeroed().assume_init() };
    // Writing a Copy field of a union is safe; only reads are not.
    let mut ifrn_name = [0 as libc::c_char; libc::IFNAMSIZ];
    for (dst, src) in ifrn_name.iter_mut().zip(name) {
        *dst = *src as libc::c_char;
    }
    ifr.ifr_ifrn.ifrn_name = ifrn_name;
    Ok(ifr)
}

// Issues one of the SIOCGIF* requests against `fd`, which fill in `ifr.ifr_ifru`.
fn interface_ioctl(fd: libc::c_int, request: libc::c_ulong, iface: &CStr) -> io::Result<linux::ifreq> {
    let mut ifr = ifreq_for(iface)?;
    // Resources:
    // man 7 netdevice
    // We believe this to be safe, as the kernel only writes within the ifreq we hand it.
    let err = unsafe { libc::ioctl(fd, request, &mut ifr as *mut linux::ifreq) };
    if err < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(ifr)
}

impl Socket {
    /// Creates a new unbound socket.
    pub fn new() -> io::Result<Self> {
        // This block must be marked as unsafe because it uses FFI with C code. We believe the code
        // in this block to be safe because it does not interact with any memory owned by Rust
        // code, nor does it violate the invariant of the Socket type -- namely, that it return an
        // Err if it fails to initialize.
        let fd = unsafe {
            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#socket
            // man 7 packet
            let fd = libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW,
                (libc::ETH_P_ALL as u16).to_be() as libc::c_int,
            );
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }
            fd
        };
        Ok(Self { fd })
    }

    /// Binds the socket to a network interface. This function consumes the `Socket` instance, as
    /// no more configuration options may be safely changed.
    pub fn bind(self, iface: impl AsRef<CStr>) -> io::Result<BoundSocket> {
        let iface = iface.as_ref();
        // ioctl(SIOCGIFINDEX) fills in the index field of the ifreq object
        let ifr = interface_ioctl(self.fd, linux::SIOCGIFINDEX, iface)?;

        // This block is marked as unsafe because it uses FFI and reads a union field, however,
        // we believe it to be safe because SIOCGIFINDEX succeeded and therefore wrote the index,
        // and bind only reads the sockaddr_ll we pass along with its exact size.
        let send_addr = unsafe {
            let mut ll: libc::sockaddr_ll = MaybeUninit::zeroed().assume_init();
            ll.sll_family = libc::AF_PACKET as libc::c_ushort;
            ll.sll_protocol = (libc::ETH_P_ALL as u16).to_be();
            // expanded from `ifr_ifindex` in kernel headers
            ll.sll_ifindex = ifr.ifr_ifru.ifru_ivalue;
            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#bind
            // man 7 packet regarding sockaddr_ll
            let err = libc::bind(
                self.fd,
                &ll as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            ll
        };
        let fd = self.fd;
        // This ensures that `self` does not attempt to close the file descriptor, as the file
        // descriptor is transferred to the BoundSocket we're returning. This doesn't cause any
        // resource leaks since the stack-bound `self` is consumed and deallocated in
        // `mem::forget`.
        mem::forget(self);
        Ok(BoundSocket {
            fd,
            send_addr,
            iface: iface.to_owned(),
        })
    }
}

impl BoundSocket {
    /// Name of the interface the socket is bound to.
    pub fn iface(&self) -> &CStr {
        &self.iface
    }

    /// Sends a frame to the NIC.
    pub fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        // This block is marked as unsafe because it uses FFI. We believe this code to be safe,
        // because it safely borrows the Rust-owned frame and passes the length of the frame to the
        // libc function, so it should not exhibit any C-side undefined behaviour.
        unsafe {
            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#sendtorecv
            let bytes = libc::sendto(
                self.fd,
                frame.as_ptr() as *const _,
                frame.len(),
                0,
                &self.send_addr as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(bytes as usize)
            }
        }
    }

    /// Receives a frame from the NIC. Frames longer than `frame` are truncated to fit.
    pub fn recv(&mut self, frame: &mut [u8]) -> io::Result<(usize, Addr)> {
        // Note comment in `send` call.
        unsafe {
            let mut storage = MaybeUninit::<libc::sockaddr_storage>::zeroed();
            let mut addrlen = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#sendtorecv
            let bytes = libc::recvfrom(
                self.fd,
                frame.as_mut_ptr() as *mut _,
                frame.len(),
                0,
                storage.as_mut_ptr() as *mut _,
                &mut addrlen,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok((
                    bytes as usize,
                    Addr {
                        inner: storage.assume_init(),
                        _len: addrlen,
                    },
                ))
            }
        }
    }

    /// Enables or disables promiscuous mode on the bound interface, for this socket only.
    pub fn set_promiscuous(&mut self, promiscuous: bool) -> io::Result<()> {
        let option = if promiscuous {
            libc::PACKET_ADD_MEMBERSHIP
        } else {
            libc::PACKET_DROP_MEMBERSHIP
        };
        let mreq = linux::packet_mreq {
            mr_ifindex: self.send_addr.sll_ifindex,
            mr_type: libc::PACKET_MR_PROMISC as libc::c_ushort,
            mr_alen: 0,
            mr_address: [0; 8],
        };
        // Resources:
        // man 7 packet regarding PACKET_ADD_MEMBERSHIP
        // The kernel only reads the packet_mreq, whose exact size we pass.
        let err = unsafe {
            libc::setsockopt(
                self.fd,
                libc::SOL_PACKET,
                option,
                &mreq as *const _ as *const libc::c_void,
                mem::size_of::<linux::packet_mreq>() as libc::socklen_t,
            )
        };
        if err < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// The MAC address of the bound interface.
    pub fn hardware_addr(&self) -> io::Result<[u8; 6]> {
        let ifr = interface_ioctl(self.fd, linux::SIOCGIFHWADDR, &self.iface)?;
        // SIOCGIFHWADDR succeeded, so ifru_hwaddr is the member the kernel wrote.
        let hwaddr = unsafe { ifr.ifr_ifru.ifru_hwaddr };
        let mut mac = [0u8; 6];
        for (dst, src) in mac.iter_mut().zip(hwaddr.sa_data.iter()) {
            *dst = *src as u8;
        }
        Ok(mac)
    }

    /// The primary IPv4 address of the bound interface. Fails if the interface has none.
    pub fn ipv4_addr(&self) -> io::Result<Ipv4Addr> {
        let ifr = interface_ioctl(self.fd, linux::SIOCGIFADDR, &self.iface)?;
        // SIOCGIFADDR succeeded, so ifru_addr is the member the kernel wrote.
        let addr = unsafe { ifr.ifr_ifru.ifru_addr };
        if addr.sa_family != libc::AF_INET as libc::sa_family_t {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "interface address is not IPv4",
            ));
        }
        // sockaddr_in: family, then a 2 byte port, then the address in network byte order
        let octets = [
            addr.sa_data[2] as u8,
            addr.sa_data[3] as u8,
            addr.sa_data[4] as u8,
            addr.sa_data[5] as u8,
        ];
        Ok(Ipv4Addr::from(octets))
    }
}

impl AsRawFd for BoundSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

/// Blocks until at least one of `sockets` has a frame waiting, then returns the indices of all
/// readable sockets in ascending order. Interrupted waits are restarted.
pub fn poll_readable(sockets: &[BoundSocket]) -> io::Result<Vec<usize>> {
    let mut fds: Vec<libc::pollfd> = sockets
        .iter()
        .map(|socket| libc::pollfd {
            fd: socket.fd,
            events: libc::POLLIN,
            revents: 0,
        })
        .collect();

    loop {
        // Resources:
        // man 2 poll
        // The kernel only touches the `revents` of the pollfds we own, and we pass their count.
        let ready = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }

        let mut readable = vec![];
        for (index, fd) in fds.iter().enumerate() {
            if fd.revents & libc::POLLIN != 0 {
                readable.push(index);
            } else if fd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    format!("socket {} reported an error while polling", index),
                ));
            }
        }
        if !readable.is_empty() {
            return Ok(readable);
        }
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl Drop for BoundSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
